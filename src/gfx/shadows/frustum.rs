//! Frustum slices and their world-space corners
//!
//! Corner order is fixed for every consumer (bounding fits, debug lines):
//!
//! | index | plane | corner       |
//! |-------|-------|--------------|
//! | 0     | near  | bottom-left  |
//! | 1     | near  | top-left     |
//! | 2     | near  | top-right    |
//! | 3     | near  | bottom-right |
//! | 4..8  | far   | same order   |

use cgmath::{Matrix4, Point3, Rad, SquareMatrix, Transform, Vector4};

use super::error::ConfigError;
use crate::gfx::camera::Camera;

/// Corner pairs forming the 12 edges of a frustum slice.
pub const FRUSTUM_EDGES: [(usize, usize); 12] = [
    // Near rectangle
    (0, 3),
    (3, 2),
    (2, 1),
    (1, 0),
    // Far rectangle
    (4, 7),
    (7, 6),
    (6, 5),
    (5, 4),
    // Connecting edges
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Signed (x, y) half-extent multipliers matching the corner table.
const CORNER_SIGNS: [(f32, f32); 4] = [(-1.0, -1.0), (-1.0, 1.0), (1.0, 1.0), (1.0, -1.0)];

/// Perspective shape captured at initialization.
///
/// Cascades only need the shape (not the view), so it is snapshotted once
/// and reused for every per-frame refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumShape {
    pub near: f32,
    pub far: f32,
    pub fov_y: Rad<f32>,
    pub aspect: f32,
}

impl FrustumShape {
    pub fn new(near: f32, far: f32, fov_y: Rad<f32>, aspect: f32) -> Result<Self, ConfigError> {
        if !near.is_finite() || !far.is_finite() || near <= 0.0 || far <= near {
            return Err(ConfigError::DegenerateFrustum { near, far });
        }
        let fov_valid = fov_y.0.is_finite() && fov_y.0 > 0.0 && fov_y.0 < std::f32::consts::PI;
        if !fov_valid || !aspect.is_finite() || aspect <= 0.0 {
            return Err(ConfigError::InvalidProjection {
                fov_y: fov_y.0,
                aspect,
            });
        }
        Ok(Self {
            near,
            far,
            fov_y,
            aspect,
        })
    }

    /// Uses the camera's depth range and field of view with an explicit aspect.
    pub fn from_camera(camera: &impl Camera, aspect: f32) -> Result<Self, ConfigError> {
        Self::new(camera.near(), camera.far(), camera.fov_y(), aspect)
    }

    /// Half width and half height of the view rectangle at `depth`.
    pub fn half_extents(&self, depth: f32) -> (f32, f32) {
        let half_height = (self.fov_y.0 * 0.5).tan() * depth;
        (half_height * self.aspect, half_height)
    }

    /// The 8 corners of the slice between `near` and `far`, in view space.
    pub fn view_space_corners(&self, near: f32, far: f32) -> [Point3<f32>; 8] {
        let mut corners = [Point3::new(0.0, 0.0, 0.0); 8];
        for (plane, depth) in [near, far].into_iter().enumerate() {
            let (half_w, half_h) = self.half_extents(depth);
            for (i, (sx, sy)) in CORNER_SIGNS.iter().enumerate() {
                corners[plane * 4 + i] = Point3::new(sx * half_w, sy * half_h, -depth);
            }
        }
        corners
    }

    /// The 8 corners of the slice between `near` and `far`, in world space.
    ///
    /// `inv_view` is the inverse of the camera's view matrix.
    pub fn world_corners(&self, near: f32, far: f32, inv_view: &Matrix4<f32>) -> [Point3<f32>; 8] {
        self.view_space_corners(near, far)
            .map(|corner| inv_view.transform_point(corner))
    }
}

/// One cascade: a depth range of the camera frustum and its light-space matrices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumSplit {
    /// View-space distance of the slice's near plane
    pub near: f32,
    /// View-space distance of the slice's far plane
    pub far: f32,
    /// World-space corners, see the module docs for the order
    pub corners: [Point3<f32>; 8],
    /// Light view-projection used to render this cascade's depth
    pub crop: Matrix4<f32>,
    /// World position to (u, v, depth) in this cascade's shadow-map layer
    pub texture: Matrix4<f32>,
}

impl FrustumSplit {
    /// Line segments for debug drawing, in [`FRUSTUM_EDGES`] order.
    pub fn edges(&self) -> [(Point3<f32>, Point3<f32>); 12] {
        FRUSTUM_EDGES.map(|(a, b)| (self.corners[a], self.corners[b]))
    }

    /// World-space corners of the light volume this cascade renders.
    pub fn light_volume_corners(&self) -> Option<[Point3<f32>; 8]> {
        corners_from_view_projection(&self.crop)
    }
}

/// Recovers the world-space box of a wgpu view-projection matrix.
///
/// Corners follow the same order as frustum slices. Returns `None` when the
/// matrix is singular.
pub fn corners_from_view_projection(view_proj: &Matrix4<f32>) -> Option<[Point3<f32>; 8]> {
    let inverse = view_proj.invert()?;
    let mut corners = [Point3::new(0.0, 0.0, 0.0); 8];
    for (plane, ndc_z) in [0.0f32, 1.0].into_iter().enumerate() {
        for (i, (sx, sy)) in CORNER_SIGNS.iter().enumerate() {
            let world = inverse * Vector4::new(*sx, *sy, ndc_z, 1.0);
            if world.w.abs() <= f32::EPSILON {
                return None;
            }
            corners[plane * 4 + i] = Point3::new(world.x / world.w, world.y / world.w, world.z / world.w);
        }
    }
    Some(corners)
}
