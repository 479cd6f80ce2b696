// src/wgpu_utils/mod.rs
//! WGPU utility functions and helpers
//!
//! Thin wrappers over bind group and uniform buffer boilerplate.

pub mod binding_builder;
pub mod binding_types;
pub mod uniform_buffer;

pub use binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc};
pub use uniform_buffer::UniformBuffer;
