// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Shadow-map textures and the views used to render and sample them.

pub mod texture_resource;

pub use texture_resource::ShadowMapArray;
