//! Error types for cascade planning and shadow-map resources

use super::MAX_CASCADES;

/// Rejected (re)initialization input.
///
/// Returned before any state is touched, so the previously computed
/// cascade set stays valid.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("split count {0} is outside of 1..={max}", max = MAX_CASCADES)]
    InvalidSplitCount(usize),

    #[error("split lambda {0} is outside of [0, 1]")]
    InvalidLambda(f32),

    #[error("near offset {0} must be finite and non-negative")]
    InvalidNearOffset(f32),

    #[error("shadow map resolution {0} is not a non-zero power of two")]
    InvalidResolution(u32),

    #[error("light direction has zero length")]
    DegenerateLightDirection,

    #[error("degenerate camera frustum (near {near}, far {far})")]
    DegenerateFrustum { near: f32, far: f32 },

    #[error("invalid camera projection (fov {fov_y} rad, aspect {aspect})")]
    InvalidProjection { fov_y: f32, aspect: f32 },

    #[error("viewport {width}x{height} has zero area")]
    InvalidViewport { width: u32, height: u32 },

    #[error("camera view matrix is not invertible")]
    SingularView,
}

/// Top-level error for the cascaded shadow map system
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CsmError {
    #[error("invalid cascade configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cascades have not been initialized")]
    Uninitialized,

    #[error("failed to create shadow map resources: {0}")]
    ResourceCreation(String),
}

impl CsmError {
    pub fn resource<T: ToString>(msg: T) -> Self {
        CsmError::ResourceCreation(msg.to_string())
    }

    /// True for errors caused by the caller's input rather than the GPU.
    pub fn is_config_error(&self) -> bool {
        matches!(self, CsmError::Config(_))
    }
}
