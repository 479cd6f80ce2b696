//! Light-space bounding volumes and crop matrix assembly
//!
//! Both strategies consume the same 8 world-space corners of a frustum slice
//! and produce an orthographic light projection around them:
//!
//! - [`FitStrategy::Tight`] uses the axis-aligned box of the corners in light
//!   view space. Best texel usage, but the box changes shape as the camera
//!   turns, which makes shadow edges shimmer.
//! - [`FitStrategy::Stable`] uses the bounding sphere of the corners. The
//!   projected square keeps its size while the camera moves and its center is
//!   snapped to whole shadow-map texels.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, MetricSpace, Point3, Transform, Vector3};

use crate::gfx::camera::OPENGL_TO_WGPU_MATRIX;

/// Smallest width, height or depth of a light volume, in world units.
pub const MIN_EXTENT: f32 = 1e-3;

/// Light directions closer than this to the world Y axis use Z as up.
const VERTICAL_LIGHT_THRESHOLD: f32 = 0.99;

/// Maps clip x/y in [-1, 1] to texture u/v in [0, 1] (v pointing down) and
/// keeps depth, which is already [0, 1] in wgpu clip space.
#[rustfmt::skip]
pub const BIAS_MATRIX: Matrix4<f32> = Matrix4::new(
    0.5,  0.0, 0.0, 0.0,
    0.0, -0.5, 0.0, 0.0,
    0.0,  0.0, 1.0, 0.0,
    0.5,  0.5, 0.0, 1.0,
);

/// How a frustum slice is bounded in light space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStrategy {
    /// Axis-aligned box around the corners
    Tight,
    /// Texel-snapped square around the corners' bounding sphere
    Stable { resolution: u32 },
}

/// Orthographic extents in light view space.
///
/// `near` and `far` are distances along the light's view direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthoBounds {
    /// Widens any axis thinner than [`MIN_EXTENT`] around its center.
    pub fn clamped(self) -> Self {
        let (left, right) = widen(self.left, self.right);
        let (bottom, top) = widen(self.bottom, self.top);
        let (near, far) = widen(self.near, self.far);
        Self {
            left,
            right,
            bottom,
            top,
            near,
            far,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// wgpu orthographic projection for these extents.
    pub fn projection(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX
            * cgmath::ortho(
                self.left,
                self.right,
                self.bottom,
                self.top,
                self.near,
                self.far,
            )
    }
}

fn widen(min: f32, max: f32) -> (f32, f32) {
    if max - min >= MIN_EXTENT {
        return (min, max);
    }
    let center = (min + max) * 0.5;
    (center - MIN_EXTENT * 0.5, center + MIN_EXTENT * 0.5)
}

/// Matrices produced for one cascade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeProjection {
    pub light_view: Matrix4<f32>,
    pub bounds: OrthoBounds,
    /// `projection * light_view`
    pub crop: Matrix4<f32>,
    /// `BIAS_MATRIX * crop`
    pub texture: Matrix4<f32>,
}

impl CascadeProjection {
    pub fn new(light_view: Matrix4<f32>, bounds: OrthoBounds) -> Self {
        let clamped = bounds.clamped();
        if clamped != bounds {
            log::warn!("Degenerate light volume {:?}, widened to {}", bounds, MIN_EXTENT);
        }
        let bounds = clamped;
        let crop = bounds.projection() * light_view;
        Self {
            light_view,
            bounds,
            crop,
            texture: BIAS_MATRIX * crop,
        }
    }
}

impl FitStrategy {
    /// Fits a light volume around `corners`.
    ///
    /// # Arguments
    /// * `corners` - World-space corners of one frustum slice
    /// * `light_dir` - Normalized direction the light travels in
    /// * `near_offset` - Distance the near plane is pulled towards the light
    pub fn fit(&self, corners: &[Point3<f32>; 8], light_dir: Vector3<f32>, near_offset: f32) -> CascadeProjection {
        match *self {
            FitStrategy::Tight => fit_tight(corners, light_dir, near_offset),
            FitStrategy::Stable { resolution } => fit_stable(corners, light_dir, near_offset, resolution),
        }
    }
}

/// Up vector for a light view, swapped to Z when the light is near-vertical.
pub fn light_up_vector(light_dir: Vector3<f32>) -> Vector3<f32> {
    if light_dir.dot(Vector3::unit_y()).abs() > VERTICAL_LIGHT_THRESHOLD {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    }
}

/// Centroid of the corners and the distance to the farthest one.
pub fn bounding_sphere(corners: &[Point3<f32>; 8]) -> (Point3<f32>, f32) {
    let center = Point3::centroid(corners);
    let radius = corners
        .iter()
        .map(|corner| corner.distance(center))
        .fold(0.0f32, f32::max);
    (center, radius)
}

fn light_view(center: Point3<f32>, light_dir: Vector3<f32>, distance: f32) -> Matrix4<f32> {
    Matrix4::look_at_rh(center - light_dir * distance, center, light_up_vector(light_dir))
}

fn fit_tight(corners: &[Point3<f32>; 8], light_dir: Vector3<f32>, near_offset: f32) -> CascadeProjection {
    let (center, radius) = bounding_sphere(corners);
    let view = light_view(center, light_dir, radius.max(MIN_EXTENT) * 2.0);

    let mut min = Vector3::new(f32::MAX, f32::MAX, f32::MAX);
    let mut max = Vector3::new(f32::MIN, f32::MIN, f32::MIN);
    for corner in corners {
        let p = view.transform_point(*corner);
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }

    // Light looks down -Z: the largest z is closest to the light
    let bounds = OrthoBounds {
        left: min.x,
        right: max.x,
        bottom: min.y,
        top: max.y,
        near: -max.z - near_offset,
        far: -min.z,
    };
    CascadeProjection::new(view, bounds)
}

fn fit_stable(
    corners: &[Point3<f32>; 8],
    light_dir: Vector3<f32>,
    near_offset: f32,
    resolution: u32,
) -> CascadeProjection {
    let (center, radius) = bounding_sphere(corners);
    // Quantize so floating-point noise cannot change the extent between frames
    let radius = ((radius * 16.0).ceil() / 16.0).max(MIN_EXTENT);

    let texels = resolution.max(2) as f32;
    // One texel of padding per side absorbs the snap below
    let half = radius + 2.0 * radius / texels;
    let texel = 2.0 * half / texels;

    // Rotation-only light basis keeps the texel grid fixed in world space
    let basis = Matrix4::look_at_rh(
        Point3::origin(),
        Point3::from_vec(light_dir),
        light_up_vector(light_dir),
    );
    let light_center = basis.transform_point(center);
    let dx = (light_center.x / texel).round() * texel - light_center.x;
    let dy = (light_center.y / texel).round() * texel - light_center.y;
    let light_right = Vector3::new(basis.x.x, basis.y.x, basis.z.x);
    let light_up = Vector3::new(basis.x.y, basis.y.y, basis.z.y);
    let snapped = center + light_right * dx + light_up * dy;

    let distance = radius * 2.0;
    let view = light_view(snapped, light_dir, distance);
    let bounds = OrthoBounds {
        left: -half,
        right: half,
        bottom: -half,
        top: half,
        near: distance - radius - near_offset,
        far: distance + radius,
    };
    CascadeProjection::new(view, bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{SquareMatrix, Vector4};

    fn slice_corners(offset: Vector3<f32>) -> [Point3<f32>; 8] {
        let near = [(-1.0, -1.0), (-1.0, 1.0), (1.0, 1.0), (1.0, -1.0)];
        let mut corners = [Point3::origin(); 8];
        for (i, (x, y)) in near.iter().enumerate() {
            corners[i] = Point3::new(*x, *y, -2.0) + offset;
            corners[i + 4] = Point3::new(x * 6.0, y * 6.0, -12.0) + offset;
        }
        corners
    }

    fn project(m: &Matrix4<f32>, p: Point3<f32>) -> Vector4<f32> {
        let v = *m * p.to_homogeneous();
        v / v.w
    }

    fn assert_contained(projection: &CascadeProjection, corners: &[Point3<f32>; 8]) {
        let eps = 1e-4;
        for corner in corners {
            let t = project(&projection.texture, *corner);
            assert!(t.x >= -eps && t.x <= 1.0 + eps, "u out of range: {}", t.x);
            assert!(t.y >= -eps && t.y <= 1.0 + eps, "v out of range: {}", t.y);
            assert!(t.z >= -eps && t.z <= 1.0 + eps, "depth out of range: {}", t.z);
        }
    }

    fn matrix_close(a: &Matrix4<f32>, b: &Matrix4<f32>, eps: f32) -> bool {
        let a: &[f32; 16] = a.as_ref();
        let b: &[f32; 16] = b.as_ref();
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= eps)
    }

    #[test]
    fn test_up_vector_swaps_for_vertical_light() {
        assert_eq!(light_up_vector(Vector3::new(0.0, -1.0, 0.0)), Vector3::unit_z());
        assert_eq!(
            light_up_vector(Vector3::new(1.0, -1.0, 0.0).normalize()),
            Vector3::unit_y()
        );
    }

    #[test]
    fn test_tight_fit_contains_corners() {
        let corners = slice_corners(Vector3::new(3.0, 1.0, -4.0));
        let dir = Vector3::new(-0.7, -1.0, 0.2).normalize();
        let projection = FitStrategy::Tight.fit(&corners, dir, 25.0);

        assert_contained(&projection, &corners);
        assert!(projection.crop.invert().is_some());
    }

    #[test]
    fn test_tight_fit_touches_box_edges() {
        let corners = slice_corners(Vector3::new(0.0, 0.0, 0.0));
        let dir = Vector3::new(0.0, -1.0, 0.0);
        let projection = FitStrategy::Tight.fit(&corners, dir, 0.0);

        let us: Vec<f32> = corners.iter().map(|c| project(&projection.texture, *c).x).collect();
        let min_u = us.iter().cloned().fold(f32::MAX, f32::min);
        let max_u = us.iter().cloned().fold(f32::MIN, f32::max);
        assert!(min_u.abs() < 1e-4);
        assert!((max_u - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_near_offset_only_moves_near_plane() {
        let corners = slice_corners(Vector3::new(0.0, 0.0, 0.0));
        let dir = Vector3::new(0.3, -1.0, 0.1).normalize();
        let base = FitStrategy::Tight.fit(&corners, dir, 0.0);
        let pulled = FitStrategy::Tight.fit(&corners, dir, 100.0);

        assert!((pulled.bounds.near - (base.bounds.near - 100.0)).abs() < 1e-3);
        assert_eq!(pulled.bounds.far, base.bounds.far);
        assert_eq!(pulled.bounds.left, base.bounds.left);
        assert_contained(&pulled, &corners);
    }

    #[test]
    fn test_stable_fit_contains_corners() {
        let corners = slice_corners(Vector3::new(10.0, 2.0, 5.0));
        let dir = Vector3::new(-1.0, -1.0, 0.0).normalize();
        let projection = FitStrategy::Stable { resolution: 256 }.fit(&corners, dir, 50.0);

        assert_contained(&projection, &corners);
        assert_eq!(projection.bounds.width(), projection.bounds.height());
    }

    #[test]
    fn test_stable_fit_only_translates_under_camera_motion() {
        let dir = Vector3::new(-0.5, -1.0, 0.25).normalize();
        let strategy = FitStrategy::Stable { resolution: 1024 };
        let a = strategy.fit(&slice_corners(Vector3::new(0.0, 0.0, 0.0)), dir, 10.0);
        let b = strategy.fit(&slice_corners(Vector3::new(7.25, 0.0, -3.5)), dir, 10.0);

        assert_eq!(a.bounds, b.bounds);
        // Upper 3x3 (rotation and scale) must match; only the w column may differ
        for col in 0..3 {
            for row in 0..4 {
                assert!((a.crop[col][row] - b.crop[col][row]).abs() < 1e-5);
            }
        }
        assert!(!matrix_close(&a.crop, &b.crop, 1e-6));
    }

    #[test]
    fn test_stable_fit_moves_in_whole_texels() {
        let dir = Vector3::new(0.2, -1.0, -0.4).normalize();
        let resolution = 512;
        let strategy = FitStrategy::Stable { resolution };
        let a = strategy.fit(&slice_corners(Vector3::new(0.0, 0.0, 0.0)), dir, 0.0);
        let b = strategy.fit(&slice_corners(Vector3::new(0.37, 0.0, 0.11)), dir, 0.0);

        let texel_ndc = 2.0 / resolution as f32;
        for axis in 0..2 {
            let shift = (b.crop.w[axis] - a.crop.w[axis]) / texel_ndc;
            assert!((shift - shift.round()).abs() < 1e-2, "shift {} texels", shift);
        }
    }

    #[test]
    fn test_degenerate_corners_stay_finite() {
        let corners = [Point3::new(1.0, 2.0, 3.0); 8];
        let dir = Vector3::new(0.0, -1.0, 0.0);

        for strategy in [FitStrategy::Tight, FitStrategy::Stable { resolution: 2048 }] {
            let projection = strategy.fit(&corners, dir, 5.0);
            let values: &[f32; 16] = projection.texture.as_ref();
            assert!(values.iter().all(|v| v.is_finite()));
            assert!(projection.crop.invert().is_some());
        }
    }
}
