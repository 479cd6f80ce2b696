// src/gfx/rendering/mod.rs
//! Shadow rendering integration
//!
//! Connects cascade planning to the GPU resources a render engine binds.

pub mod cascaded_shadow_maps;
pub mod shaders;

pub use cascaded_shadow_maps::CascadedShadowMaps;
pub use shaders::CSM_SAMPLING_SHADER;
