// src/wgpu_utils/binding_types.rs
//! Binding type shorthands for shadow-map bind group layouts

pub fn uniform() -> wgpu::BindingType {
    wgpu::BindingType::Buffer {
        ty: wgpu::BufferBindingType::Uniform,
        has_dynamic_offset: false,
        min_binding_size: None,
    }
}

pub fn sampler(filtering: wgpu::SamplerBindingType) -> wgpu::BindingType {
    wgpu::BindingType::Sampler(filtering)
}

/// Depth-comparison sampler, paired with [`depth_texture_2d_array`].
pub fn comparison_sampler() -> wgpu::BindingType {
    sampler(wgpu::SamplerBindingType::Comparison)
}

/// One depth layer per cascade.
pub fn depth_texture_2d_array() -> wgpu::BindingType {
    wgpu::BindingType::Texture {
        sample_type: wgpu::TextureSampleType::Depth,
        view_dimension: wgpu::TextureViewDimension::D2Array,
        multisampled: false,
    }
}
