// src/lib.rs
//! Cascaded shadow maps for wgpu
//!
//! Plans practical split-scheme (PSSM) cascades for a directional light,
//! fits an orthographic crop matrix around each frustum slice and manages
//! the layered depth texture and uniforms a renderer needs to draw and
//! sample them.

pub mod gfx;
pub mod prelude;
pub mod wgpu_utils;
