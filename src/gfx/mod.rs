//! # Graphics Module
//!
//! Cascaded shadow mapping for a directional light, split into CPU planning
//! and GPU resources.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - The `Camera` trait the planner reads and a fly camera
//! - **Cascade Planning** ([`shadows`]) - Split depths, frustum slices and light matrices
//! - **Resource Management** ([`resources`]) - Layered depth textures
//! - **Rendering** ([`rendering`]) - Uniforms, bind groups and shadow passes
//!
//! ## Usage
//!
//! ```no_run
//! use cascaded_shadows::gfx::camera::FlyCamera;
//! use cascaded_shadows::gfx::shadows::{CascadeConfig, CascadePlanner, Viewport};
//! use cgmath::Vector3;
//!
//! let camera = FlyCamera::new(
//!     60.0,
//!     0.1,
//!     1000.0,
//!     16.0 / 9.0,
//!     Vector3::new(0.0, 5.0, 20.0),
//!     Vector3::new(0.0, 0.0, -1.0),
//! );
//! let mut planner = CascadePlanner::new();
//! planner
//!     .initialize(
//!         CascadeConfig::default(),
//!         &camera,
//!         Viewport::new(1920, 1080),
//!         Vector3::new(-1.0, -1.0, 0.0),
//!     )
//!     .expect("valid configuration");
//! ```

pub mod camera;
pub mod rendering;
pub mod resources;
pub mod shadows;

pub use camera::{Camera, FlyCamera};
pub use rendering::CascadedShadowMaps;
pub use shadows::{CascadeConfig, CascadePlanner, CsmError};
