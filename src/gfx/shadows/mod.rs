//! Cascaded shadow map planning
//!
//! Splits the camera frustum into depth slices and fits a directional-light
//! orthographic projection around each one. Everything here is CPU-side math;
//! GPU allocation lives in [`crate::gfx::rendering::CascadedShadowMaps`].

pub mod config;
pub mod error;
pub mod fitting;
pub mod frustum;
pub mod planner;
pub mod split_scheme;
pub mod uniforms;

/// Upper bound on the number of cascades, fixed by the uniform layout.
pub const MAX_CASCADES: usize = 4;

pub use config::{normalize_light_direction, CascadeConfig, Viewport};
pub use error::{ConfigError, CsmError};
pub use fitting::{CascadeProjection, FitStrategy, OrthoBounds, BIAS_MATRIX};
pub use frustum::{corners_from_view_projection, FrustumShape, FrustumSplit, FRUSTUM_EDGES};
pub use planner::{CascadePlanner, CascadeSet, PlannerState, CASCADE_BLEND_BAND};
pub use split_scheme::{split_depths, split_ranges, SplitDepths};
pub use uniforms::{CsmUniform, ShadowOptions, ShadowPassUniform, DEFAULT_DEPTH_BIAS};
