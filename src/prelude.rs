//! # Prelude
//!
//! Common imports for renderers that use cascaded shadow maps.
//!
//! ```rust
//! use cascaded_shadows::prelude::*;
//!
//! let config = CascadeConfig::default().with_split_count(3).with_stable(true);
//! assert!(config.validate().is_ok());
//! ```

// Camera types
pub use crate::gfx::camera::{Camera, FlyCamera};

// Cascade planning
pub use crate::gfx::shadows::{
    CascadeConfig, CascadePlanner, CascadeSet, ConfigError, CsmError, CsmUniform, FrustumSplit,
    PlannerState, ShadowOptions, Viewport, FRUSTUM_EDGES, MAX_CASCADES,
};

// GPU integration
pub use crate::gfx::resources::ShadowMapArray;
pub use crate::gfx::rendering::CascadedShadowMaps;

// Common external types
pub use cgmath::{InnerSpace, Matrix4, Point3, Vector3};
