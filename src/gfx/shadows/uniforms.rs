//! GPU-facing uniform payloads
//!
//! Layouts must match the WGSL structs exactly:
//!
//! ```wgsl
//! struct CsmUniform {
//!     direction: vec4<f32>,
//!     options: vec4<f32>,
//!     far_bounds: vec4<f32>,
//!     view_far_bounds: vec4<f32>,
//!     cascade_count: u32,
//!     camera_near: f32,
//!     texture_matrices: array<mat4x4<f32>, 4>,
//! };
//! ```

use cgmath::{Matrix4, SquareMatrix};

use super::error::CsmError;
use super::planner::CascadePlanner;
use super::MAX_CASCADES;
use crate::gfx::camera::Camera;

/// Depth bias applied to surfaces facing the light head-on.
pub const DEFAULT_DEPTH_BIAS: f32 = 0.0005;

/// Scene-pass switches, packed into the `options` vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowOptions {
    pub enabled: bool,
    /// Tint fragments by cascade index
    pub show_cascades: bool,
    /// Blend across cascade borders in the shader
    pub blend: bool,
    /// Minimum comparison bias, scaled up on grazing surfaces
    pub depth_bias: f32,
}

impl Default for ShadowOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            show_cascades: false,
            blend: true,
            depth_bias: DEFAULT_DEPTH_BIAS,
        }
    }
}

impl ShadowOptions {
    fn to_vec4(self) -> [f32; 4] {
        let flag = |on: bool| if on { 1.0 } else { 0.0 };
        [
            flag(self.enabled),
            flag(self.show_cascades),
            flag(self.blend),
            self.depth_bias,
        ]
    }

    /// Bias subtracted from the receiver depth before comparison.
    ///
    /// Same formula as `csm_sample`: grows as `n_dot_l` falls, never below
    /// `depth_bias`.
    pub fn slope_scaled_bias(&self, n_dot_l: f32) -> f32 {
        (self.depth_bias * (1.0 - n_dot_l)).max(self.depth_bias)
    }
}

/// Everything the scene pass needs to sample the cascades
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CsmUniform {
    /// Light direction, w = 0
    pub direction: [f32; 4],
    pub options: [f32; 4],
    /// Far bound of each cascade as a [0, 1] depth-buffer value
    pub far_bounds: [f32; 4],
    /// Far bound of each cascade in view space, for the blend band
    pub view_far_bounds: [f32; 4],
    pub cascade_count: u32,
    /// View-space start of cascade 0
    pub camera_near: f32,
    pub _padding: [u32; 2],
    /// World to (u, v, depth) per cascade
    pub texture_matrices: [[[f32; 4]; 4]; MAX_CASCADES],
}
// 16 * 5 + 4 * 64 = 336 bytes

impl Default for CsmUniform {
    fn default() -> Self {
        let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
        Self {
            direction: [0.0, -1.0, 0.0, 0.0],
            options: ShadowOptions::default().to_vec4(),
            far_bounds: [1.0; 4],
            view_far_bounds: [f32::MAX; 4],
            cascade_count: 0,
            camera_near: 0.0,
            _padding: [0; 2],
            texture_matrices: [identity; MAX_CASCADES],
        }
    }
}

impl CsmUniform {
    /// Packs the planner's current cascades.
    ///
    /// `camera` supplies the projection used to turn view-space far bounds into
    /// depth-buffer values. Unused slots keep identity matrices and a far bound
    /// of 1.0. View-space bounds go alongside so the shader can measure the
    /// blend band linearly.
    pub fn from_planner(
        planner: &CascadePlanner,
        camera: &impl Camera,
        options: ShadowOptions,
    ) -> Result<Self, CsmError> {
        if !planner.is_ready() {
            return Err(CsmError::Uninitialized);
        }

        let mut uniform = Self {
            options: options.to_vec4(),
            ..Self::default()
        };
        let dir = planner.light_direction();
        uniform.direction = [dir.x, dir.y, dir.z, 0.0];

        let depths = planner.depth_far_bounds(&camera.projection_matrix());
        for (slot, depth) in uniform.far_bounds.iter_mut().zip(depths.iter()) {
            *slot = *depth;
        }
        for (i, split) in planner.cascades().iter().enumerate() {
            uniform.texture_matrices[i] = split.texture.into();
            uniform.view_far_bounds[i] = split.far;
        }
        uniform.camera_near = planner.cascades()[0].near;
        uniform.cascade_count = planner.split_count() as u32;
        Ok(uniform)
    }
}

/// Per-cascade shadow-pass payload
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowPassUniform {
    /// Light view-projection for this cascade
    pub crop: [[f32; 4]; 4],
}

impl From<Matrix4<f32>> for ShadowPassUniform {
    fn from(crop: Matrix4<f32>) -> Self {
        Self { crop: crop.into() }
    }
}
