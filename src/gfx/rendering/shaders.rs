//! Cascaded Shadow Shaders Module
//!
//! WGSL sources matching [`CsmUniform`](crate::gfx::shadows::CsmUniform) and
//! the scene bind group layout of
//! [`CascadedShadowMaps`](super::CascadedShadowMaps), bound at group 1.

/// Cascade selection, biased 3x3 PCF, border blending and debug tint.
///
/// Concatenate into a scene shader and call `csm_shadow_factor(world_pos,
/// frag_position.z, view_depth, n_dot_l)` from the fragment stage.
pub const CSM_SAMPLING_SHADER: &str = include_str!("shaders/csm_sampling.wgsl");
