//! Cascade planner
//!
//! Owns the cascade set and rebuilds it from scratch on every
//! [`initialize`](CascadePlanner::initialize). Per-frame
//! [`update`](CascadePlanner::update) reuses the split depths and frustum shape
//! captured at initialization and only re-derives corners and matrices from
//! the current camera view and light direction.
//!
//! Both operations compute the complete new set before replacing the old one,
//! so a rejected call leaves the previous cascades untouched.

use std::ops::Index;

use cgmath::{Matrix4, SquareMatrix, Vector3, Vector4};
use smallvec::SmallVec;

use super::config::{normalize_light_direction, CascadeConfig, Viewport};
use super::error::{ConfigError, CsmError};
use super::frustum::{FrustumShape, FrustumSplit};
use super::split_scheme::{split_depths, split_ranges, SplitDepths};
use super::MAX_CASCADES;
use crate::gfx::camera::Camera;

/// Fraction at the far end of each cascade's view-space range that the
/// shader cross-fades into the next cascade.
pub const CASCADE_BLEND_BAND: f32 = 0.1;

/// Lifecycle of a [`CascadePlanner`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    Uninitialized,
    Ready,
}

/// Ordered, contiguous frustum splits, nearest first.
///
/// At most [`MAX_CASCADES`] entries. `splits[i].far == splits[i + 1].near`,
/// the first near is the camera near plane and the last far the camera far
/// plane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeSet {
    splits: SmallVec<[FrustumSplit; MAX_CASCADES]>,
}

impl CascadeSet {
    /// Wraps `splits`, rejecting empty, oversized or non-contiguous input.
    pub fn new(splits: SmallVec<[FrustumSplit; MAX_CASCADES]>) -> Result<Self, ConfigError> {
        if splits.is_empty() || splits.len() > MAX_CASCADES {
            return Err(ConfigError::InvalidSplitCount(splits.len()));
        }
        for split in &splits {
            if split.near.is_nan() || split.far.is_nan() || split.near >= split.far {
                return Err(ConfigError::DegenerateFrustum {
                    near: split.near,
                    far: split.far,
                });
            }
        }
        for pair in splits.windows(2) {
            if pair[0].far != pair[1].near {
                return Err(ConfigError::DegenerateFrustum {
                    near: pair[0].far,
                    far: pair[1].near,
                });
            }
        }
        Ok(Self { splits })
    }

    pub fn len(&self) -> usize {
        self.splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FrustumSplit> {
        self.splits.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrustumSplit> {
        self.splits.iter()
    }

    pub fn as_slice(&self) -> &[FrustumSplit] {
        &self.splits
    }

    /// Far bound of every split in view-space distance.
    pub fn far_bounds(&self) -> SmallVec<[f32; MAX_CASCADES]> {
        self.splits.iter().map(|split| split.far).collect()
    }
}

impl Index<usize> for CascadeSet {
    type Output = FrustumSplit;

    fn index(&self, index: usize) -> &FrustumSplit {
        &self.splits[index]
    }
}

impl<'a> IntoIterator for &'a CascadeSet {
    type Item = &'a FrustumSplit;
    type IntoIter = std::slice::Iter<'a, FrustumSplit>;

    fn into_iter(self) -> Self::IntoIter {
        self.splits.iter()
    }
}

/// Everything captured by a successful initialization
#[derive(Debug, Clone, PartialEq)]
struct PlanInputs {
    config: CascadeConfig,
    shape: FrustumShape,
    depths: SplitDepths,
}

/// Computes cascade split depths, frustum corners and light matrices
#[derive(Debug, Clone)]
pub struct CascadePlanner {
    inputs: Option<PlanInputs>,
    light_direction: Vector3<f32>,
    cascades: CascadeSet,
}

impl Default for CascadePlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl CascadePlanner {
    pub fn new() -> Self {
        Self {
            inputs: None,
            light_direction: Vector3::new(0.0, -1.0, 0.0),
            cascades: CascadeSet::default(),
        }
    }

    /// (Re)builds the whole cascade set.
    ///
    /// Call whenever the configuration, the camera's projection shape, the
    /// viewport or the light direction changes. On error the planner keeps its
    /// previous state and cascades.
    ///
    /// # Arguments
    /// * `config` - Cascade configuration, validated here
    /// * `camera` - Source of the depth range, field of view and view matrix
    /// * `viewport` - Render target size; its aspect ratio shapes the slices
    /// * `light_direction` - Direction the light travels in, normalized here
    pub fn initialize(
        &mut self,
        config: CascadeConfig,
        camera: &impl Camera,
        viewport: Viewport,
        light_direction: Vector3<f32>,
    ) -> Result<(), CsmError> {
        let result = Self::plan(config, camera, viewport, light_direction);
        let (inputs, light_direction, cascades) = match result {
            Ok(planned) => planned,
            Err(err) => {
                log::warn!("Rejected cascade initialization: {}", err);
                return Err(err.into());
            }
        };

        log::debug!(
            "Initialized {} cascades, far bounds {:?}, stable: {}",
            cascades.len(),
            cascades.far_bounds().as_slice(),
            inputs.config.stable
        );

        self.inputs = Some(inputs);
        self.light_direction = light_direction;
        self.cascades = cascades;
        Ok(())
    }

    /// Refreshes corners and matrices from the current camera view.
    ///
    /// Split depths and frustum shape stay as captured by the last
    /// [`initialize`](Self::initialize).
    pub fn update(&mut self, camera: &impl Camera, light_direction: Vector3<f32>) -> Result<(), CsmError> {
        let inputs = self.inputs.as_ref().ok_or(CsmError::Uninitialized)?;
        let light_direction = normalize_light_direction(light_direction)?;
        let cascades = build_cascades(inputs, camera, light_direction)?;

        self.light_direction = light_direction;
        self.cascades = cascades;
        Ok(())
    }

    fn plan(
        config: CascadeConfig,
        camera: &impl Camera,
        viewport: Viewport,
        light_direction: Vector3<f32>,
    ) -> Result<(PlanInputs, Vector3<f32>, CascadeSet), ConfigError> {
        config.validate()?;
        viewport.validate()?;
        let light_direction = normalize_light_direction(light_direction)?;
        let shape = FrustumShape::from_camera(camera, viewport.aspect())?;
        let depths = split_depths(shape.near, shape.far, config.split_count, config.lambda);

        let inputs = PlanInputs {
            config,
            shape,
            depths,
        };
        let cascades = build_cascades(&inputs, camera, light_direction)?;
        Ok((inputs, light_direction, cascades))
    }

    pub fn state(&self) -> PlannerState {
        if self.inputs.is_some() {
            PlannerState::Ready
        } else {
            PlannerState::Uninitialized
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == PlannerState::Ready
    }

    /// Perspective shape captured by the last initialization.
    pub fn frustum_shape(&self) -> Option<&FrustumShape> {
        self.inputs.as_ref().map(|inputs| &inputs.shape)
    }

    /// Normalized light direction used for the current matrices.
    pub fn light_direction(&self) -> Vector3<f32> {
        self.light_direction
    }

    pub fn cascades(&self) -> &CascadeSet {
        &self.cascades
    }

    /// Number of cascades, zero before initialization.
    pub fn split_count(&self) -> usize {
        self.cascades.len()
    }

    /// View-space far bound of cascade `index`.
    pub fn far_bound(&self, index: usize) -> Option<f32> {
        self.cascades.get(index).map(|split| split.far)
    }

    /// Light view-projection for rendering cascade `index`.
    pub fn crop_matrix(&self, index: usize) -> Option<Matrix4<f32>> {
        self.cascades.get(index).map(|split| split.crop)
    }

    /// World to shadow-map (u, v, depth) for cascade `index`.
    pub fn texture_matrix(&self, index: usize) -> Option<Matrix4<f32>> {
        self.cascades.get(index).map(|split| split.texture)
    }

    pub fn corners(&self, index: usize) -> Option<&[cgmath::Point3<f32>; 8]> {
        self.cascades.get(index).map(|split| &split.corners)
    }

    /// Cascade that covers a fragment at `view_depth`.
    ///
    /// Mirrors the shader rule: the first cascade whose far bound reaches the
    /// depth, or the last cascade beyond every bound.
    pub fn cascade_for_depth(&self, view_depth: f32) -> Option<usize> {
        if self.cascades.is_empty() {
            return None;
        }
        let index = self
            .cascades
            .iter()
            .position(|split| view_depth <= split.far)
            .unwrap_or(self.cascades.len() - 1);
        Some(index)
    }

    /// Cascade at `view_depth` and the weight of the next cascade there.
    ///
    /// Mirrors `csm_shadow_factor`: the weight is zero until the last
    /// [`CASCADE_BLEND_BAND`] of the cascade's own view-space range and
    /// reaches 1.0 at its far bound. The last cascade never blends.
    pub fn cascade_blend(&self, view_depth: f32) -> Option<(usize, f32)> {
        let index = self.cascade_for_depth(view_depth)?;
        if index + 1 >= self.cascades.len() {
            return Some((index, 0.0));
        }
        let split = &self.cascades[index];
        let t = (view_depth - split.near) / (split.far - split.near).max(f32::EPSILON);
        let weight = ((t - (1.0 - CASCADE_BLEND_BAND)) / CASCADE_BLEND_BAND).clamp(0.0, 1.0);
        Some((index, weight))
    }

    /// Far bounds projected to [0, 1] depth-buffer values through `projection`.
    ///
    /// Lets a shader pick a cascade by comparing against the fragment's
    /// `position.z` instead of reconstructing view depth.
    pub fn depth_far_bounds(&self, projection: &Matrix4<f32>) -> SmallVec<[f32; MAX_CASCADES]> {
        self.cascades
            .iter()
            .map(|split| {
                let clip = *projection * Vector4::new(0.0, 0.0, -split.far, 1.0);
                if clip.w.abs() <= f32::EPSILON {
                    1.0
                } else {
                    (clip.z / clip.w).clamp(0.0, 1.0)
                }
            })
            .collect()
    }
}

fn build_cascades(
    inputs: &PlanInputs,
    camera: &impl Camera,
    light_direction: Vector3<f32>,
) -> Result<CascadeSet, ConfigError> {
    let inv_view = camera.view_matrix().invert().ok_or(ConfigError::SingularView)?;
    let strategy = inputs.config.fit_strategy();

    let splits = split_ranges(inputs.shape.near, &inputs.depths)
        .into_iter()
        .map(|(near, far)| {
            let corners = inputs.shape.world_corners(near, far, &inv_view);
            let projection = strategy.fit(&corners, light_direction, inputs.config.near_offset);
            FrustumSplit {
                near,
                far,
                corners,
                crop: projection.crop,
                texture: projection.texture,
            }
        })
        .collect();

    CascadeSet::new(splits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::FlyCamera;
    use cgmath::{EuclideanSpace, InnerSpace};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn reference_camera() -> FlyCamera {
        FlyCamera::new(
            60.0,
            0.1,
            1000.0,
            16.0 / 9.0,
            Vector3::new(0.0, 5.0, 20.0),
            Vector3::new(0.0, 0.0, -1.0),
        )
    }

    fn reference_viewport() -> Viewport {
        Viewport::new(1920, 1080)
    }

    fn all_finite(m: &Matrix4<f32>) -> bool {
        let values: &[f32; 16] = m.as_ref();
        values.iter().all(|v| v.is_finite())
    }

    fn ready_planner(config: CascadeConfig) -> CascadePlanner {
        let mut planner = CascadePlanner::new();
        planner
            .initialize(
                config,
                &reference_camera(),
                reference_viewport(),
                Vector3::new(-1.0, -1.0, 0.0),
            )
            .unwrap();
        planner
    }

    #[test]
    fn test_starts_uninitialized() {
        let mut planner = CascadePlanner::new();

        assert_eq!(planner.state(), PlannerState::Uninitialized);
        assert_eq!(planner.split_count(), 0);
        assert_eq!(planner.cascade_for_depth(1.0), None);
        assert_eq!(
            planner.update(&reference_camera(), Vector3::new(0.0, -1.0, 0.0)),
            Err(CsmError::Uninitialized)
        );
    }

    #[test]
    fn test_reference_scenario() {
        init_logger();
        let config = CascadeConfig::default()
            .with_split_count(4)
            .with_lambda(0.3);
        let mut planner = CascadePlanner::new();
        planner
            .initialize(
                config,
                &reference_camera(),
                reference_viewport(),
                Vector3::new(0.0, -1.0, 0.0),
            )
            .unwrap();

        assert_eq!(planner.state(), PlannerState::Ready);
        assert_eq!(planner.split_count(), 4);

        let expected = [175.3525, 353.035, 555.0175, 1000.0];
        for (i, e) in expected.iter().enumerate() {
            let bound = planner.far_bound(i).unwrap();
            assert!((bound - e).abs() < 0.05, "cascade {}: {} != {}", i, bound, e);
            let crop = planner.crop_matrix(i).unwrap();
            assert!(crop.invert().is_some());
            assert!(all_finite(&crop));
        }
        assert_eq!(planner.far_bound(3), Some(1000.0));
    }

    #[test]
    fn test_cascade_set_is_contiguous() {
        for count in 1..=MAX_CASCADES {
            let planner = ready_planner(CascadeConfig::default().with_split_count(count));
            let cascades = planner.cascades();

            assert_eq!(cascades.len(), count);
            assert_eq!(cascades[0].near, 0.1);
            assert_eq!(cascades[count - 1].far, 1000.0);
            for pair in cascades.as_slice().windows(2) {
                assert_eq!(pair[0].far, pair[1].near);
                assert!(pair[0].far < pair[1].far);
            }
        }
    }

    #[test]
    fn test_corners_project_inside_texture() {
        for stable in [false, true] {
            let planner = ready_planner(CascadeConfig::default().with_stable(stable));

            for split in planner.cascades() {
                for corner in &split.corners {
                    let t = split.texture * corner.to_homogeneous();
                    let (u, v, depth) = (t.x / t.w, t.y / t.w, t.z / t.w);
                    assert!((-1e-3..=1.0 + 1e-3).contains(&u), "u {}", u);
                    assert!((-1e-3..=1.0 + 1e-3).contains(&v), "v {}", v);
                    assert!((-1e-3..=1.0 + 1e-3).contains(&depth), "depth {}", depth);
                }
            }
        }
    }

    #[test]
    fn test_rejected_config_keeps_previous_set() {
        init_logger();
        let mut planner = ready_planner(CascadeConfig::default());
        let before = planner.cascades().clone();

        let err = planner
            .initialize(
                CascadeConfig::default().with_split_count(0),
                &reference_camera(),
                reference_viewport(),
                Vector3::new(0.0, -1.0, 0.0),
            )
            .unwrap_err();
        assert_eq!(err, CsmError::Config(ConfigError::InvalidSplitCount(0)));

        let err = planner
            .initialize(
                CascadeConfig::default(),
                &reference_camera(),
                reference_viewport(),
                Vector3::new(0.0, 0.0, 0.0),
            )
            .unwrap_err();
        assert!(err.is_config_error());

        assert_eq!(planner.cascades(), &before);
        assert_eq!(planner.state(), PlannerState::Ready);
    }

    #[test]
    fn test_degenerate_frustum_is_rejected() {
        let mut camera = reference_camera();
        camera.update_projection(60.0, 10.0, 10.0, 16.0 / 9.0);
        let mut planner = CascadePlanner::new();

        let err = planner
            .initialize(
                CascadeConfig::default(),
                &camera,
                reference_viewport(),
                Vector3::new(0.0, -1.0, 0.0),
            )
            .unwrap_err();

        assert_eq!(
            err,
            CsmError::Config(ConfigError::DegenerateFrustum {
                near: 10.0,
                far: 10.0
            })
        );
        assert_eq!(planner.state(), PlannerState::Uninitialized);
        assert!(planner.cascades().iter().all(|s| all_finite(&s.crop)));
    }

    #[test]
    fn test_update_follows_camera_and_light() {
        let mut planner = ready_planner(CascadeConfig::default());
        let before = planner.crop_matrix(0).unwrap();

        let mut camera = reference_camera();
        camera.set_translation_delta(camera.forward(), 12.0);
        planner
            .update(&camera, Vector3::new(0.0, -2.0, 0.0))
            .unwrap();

        assert_ne!(planner.crop_matrix(0).unwrap(), before);
        assert!((planner.light_direction().magnitude() - 1.0).abs() < 1e-6);
        let corner = planner.corners(0).unwrap()[0];
        let depth = (corner - camera.position()).dot(camera.forward());
        assert!((depth - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_update_rejects_zero_light() {
        let mut planner = ready_planner(CascadeConfig::default());
        let before = planner.cascades().clone();

        assert!(planner
            .update(&reference_camera(), Vector3::new(0.0, 0.0, 0.0))
            .is_err());
        assert_eq!(planner.cascades(), &before);
    }

    #[test]
    fn test_stable_crop_translation_only() {
        let config = CascadeConfig::default().with_stable(true);
        let mut planner = ready_planner(config);
        let camera = reference_camera();
        let light = Vector3::new(-1.0, -1.0, 0.0);
        planner.update(&camera, light).unwrap();
        let before: Vec<_> = planner.cascades().iter().map(|s| s.crop).collect();

        let mut moved = camera;
        moved.set_translation_delta(Vector3::new(1.0, 0.0, 0.0), 3.5);
        planner.update(&moved, light).unwrap();

        for (a, split) in before.iter().zip(planner.cascades()) {
            for col in 0..3 {
                for row in 0..4 {
                    assert!((a[col][row] - split.crop[col][row]).abs() < 1e-5);
                }
            }
        }
    }

    #[test]
    fn test_cascade_selection() {
        let planner = ready_planner(CascadeConfig::default());

        assert_eq!(planner.cascade_for_depth(0.5), Some(0));
        assert_eq!(planner.cascade_for_depth(200.0), Some(1));
        assert_eq!(planner.cascade_for_depth(999.0), Some(3));
        assert_eq!(planner.cascade_for_depth(5000.0), Some(3));
    }

    #[test]
    fn test_blend_stays_off_outside_band() {
        let planner = ready_planner(CascadeConfig::default());
        let first = planner.cascades()[0];
        let band_start = first.near + (first.far - first.near) * (1.0 - CASCADE_BLEND_BAND);

        for depth in [0.1, 5.0, 20.0, 50.0, 120.0, band_start - 0.5] {
            assert_eq!(planner.cascade_blend(depth), Some((0, 0.0)), "depth {}", depth);
        }
        let (index, mid) = planner.cascade_blend((band_start + first.far) * 0.5).unwrap();
        assert_eq!(index, 0);
        assert!((mid - 0.5).abs() < 1e-2, "mid-band weight {}", mid);
        let (_, edge) = planner.cascade_blend(first.far).unwrap();
        assert!((edge - 1.0).abs() < 1e-5);

        // Last cascade has nothing to blend into
        assert_eq!(planner.cascade_blend(999.0), Some((3, 0.0)));
        assert_eq!(CascadePlanner::new().cascade_blend(1.0), None);
    }

    #[test]
    fn test_depth_far_bounds_are_monotonic() {
        let planner = ready_planner(CascadeConfig::default());
        let projection = reference_camera().projection_matrix();
        let depths = planner.depth_far_bounds(&projection);

        assert_eq!(depths.len(), 4);
        for pair in depths.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!((depths[3] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cascade_set_rejects_gaps() {
        let split = |near: f32, far: f32| FrustumSplit {
            near,
            far,
            corners: [cgmath::Point3::origin(); 8],
            crop: Matrix4::identity(),
            texture: Matrix4::identity(),
        };

        assert!(CascadeSet::new(SmallVec::new()).is_err());
        assert!(CascadeSet::new(smallvec::smallvec![split(2.0, 2.0)]).is_err());
        assert!(CascadeSet::new(smallvec::smallvec![split(1.0, 2.0), split(2.0, 1.5)]).is_err());
        assert!(CascadeSet::new(smallvec::smallvec![split(1.0, f32::NAN)]).is_err());
        assert!(CascadeSet::new(smallvec::smallvec![split(1.0, 2.0), split(2.5, 3.0)]).is_err());
        assert!(CascadeSet::new(smallvec::smallvec![split(1.0, 2.0), split(2.0, 3.0)]).is_ok());
    }
}
