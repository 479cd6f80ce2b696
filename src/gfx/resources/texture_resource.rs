//! Shadow-map texture resources for wgpu
//!
//! Allocates the layered depth texture that cascades render into, with one
//! render view per layer and a single array view for sampling in the scene
//! pass.

use crate::gfx::shadows::CsmError;

/// Layered depth texture plus the views and sampler needed to use it
///
/// - Texture: square `resolution` layers, one per cascade
/// - Layer views: render targets for the shadow pass
/// - Array view: sampled by the scene pass
/// - Sampler: depth comparison
pub struct ShadowMapArray {
    pub texture: wgpu::Texture,
    pub layer_views: Vec<wgpu::TextureView>,
    pub array_view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    resolution: u32,
    layers: u32,
}

impl ShadowMapArray {
    /// Depth format shared by the texture and every view
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Allocates a `resolution` x `resolution` depth array with `layers` layers.
    ///
    /// Limits are checked up front; anything the device still rejects is
    /// caught through an error scope and returned as
    /// [`CsmError::ResourceCreation`] instead of surfacing as an uncaptured
    /// device error.
    ///
    /// # Arguments
    /// * `device` - WGPU device for creating resources
    /// * `resolution` - Edge length of each layer in texels
    /// * `layers` - Number of cascades
    pub fn new(device: &wgpu::Device, resolution: u32, layers: u32) -> Result<Self, CsmError> {
        let limits = device.limits();
        if resolution == 0 || resolution > limits.max_texture_dimension_2d {
            return Err(CsmError::resource(format!(
                "shadow map resolution {} exceeds device limit {}",
                resolution, limits.max_texture_dimension_2d
            )));
        }
        if layers == 0 || layers > limits.max_texture_array_layers {
            return Err(CsmError::resource(format!(
                "{} shadow map layers exceed device limit {}",
                layers, limits.max_texture_array_layers
            )));
        }

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let resource = Self::create(device, resolution, layers);

        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());
        if let Some(err) = validation.or(out_of_memory) {
            resource.texture.destroy();
            return Err(CsmError::resource(err));
        }

        log::info!(
            "Allocated shadow map array: {} layers of {}x{}",
            layers,
            resolution,
            resolution
        );
        Ok(resource)
    }

    fn create(device: &wgpu::Device, resolution: u32, layers: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Cascaded Shadow Map Array"),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let layer_views = (0..layers)
            .map(|layer| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(&format!("Shadow Map Layer {}", layer)),
                    format: Some(Self::DEPTH_FORMAT),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    aspect: wgpu::TextureAspect::DepthOnly,
                    base_array_layer: layer,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        let array_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Shadow Map Array View"),
            format: Some(Self::DEPTH_FORMAT),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            aspect: wgpu::TextureAspect::DepthOnly,
            base_array_layer: 0,
            array_layer_count: Some(layers),
            ..Default::default()
        });

        // Depth comparison sampler for PCF lookups
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            layer_views,
            array_view,
            sampler,
            resolution,
            layers,
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }

    /// Render target for cascade `index`.
    pub fn layer_view(&self, index: usize) -> Option<&wgpu::TextureView> {
        self.layer_views.get(index)
    }

    /// Frees the GPU memory now instead of waiting for the last handle to drop.
    pub fn release(self) {
        log::info!(
            "Releasing shadow map array: {} layers of {}x{}",
            self.layers,
            self.resolution,
            self.resolution
        );
        self.texture.destroy();
    }
}
