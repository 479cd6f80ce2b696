//! Cascaded shadow maps on the GPU
//!
//! Pairs a [`CascadePlanner`] with the resources a renderer binds:
//!
//! - a layered depth texture with one layer per cascade
//! - the scene-pass uniform, depth array and comparison sampler in one bind group
//! - one crop-matrix uniform and bind group per cascade for the shadow pass
//!
//! Typical frame:
//!
//! ```no_run
//! # fn frame(
//! #     csm: &mut cascaded_shadows::gfx::rendering::CascadedShadowMaps,
//! #     queue: &wgpu::Queue,
//! #     encoder: &mut wgpu::CommandEncoder,
//! #     camera: &cascaded_shadows::gfx::camera::FlyCamera,
//! # ) -> Result<(), cascaded_shadows::gfx::shadows::CsmError> {
//! csm.update(queue, camera, cgmath::Vector3::new(-1.0, -1.0, 0.0))?;
//! for cascade in 0..csm.planner().split_count() {
//!     if let Some(pass) = csm.begin_shadow_pass(encoder, cascade, 0) {
//!         // set the depth-only pipeline and draw shadow casters
//!         drop(pass);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use cgmath::Vector3;

use crate::gfx::camera::Camera;
use crate::gfx::resources::ShadowMapArray;
use crate::gfx::shadows::{
    CascadeConfig, CascadePlanner, CsmError, CsmUniform, ShadowOptions, ShadowPassUniform, Viewport,
};
use crate::wgpu_utils::{
    binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc, UniformBuffer,
};

/// Resources sized for one cascade configuration
struct CascadeResources {
    shadow_maps: ShadowMapArray,
    csm_ubo: UniformBuffer<CsmUniform>,
    scene_bind_group: wgpu::BindGroup,
    pass_ubos: Vec<UniformBuffer<ShadowPassUniform>>,
    pass_bind_groups: Vec<wgpu::BindGroup>,
}

impl CascadeResources {
    fn new(
        device: &wgpu::Device,
        scene_layout: &BindGroupLayoutWithDesc,
        pass_layout: &BindGroupLayoutWithDesc,
        resolution: u32,
        layers: u32,
    ) -> Result<Self, CsmError> {
        let shadow_maps = ShadowMapArray::new(device, resolution, layers)?;

        let csm_ubo = UniformBuffer::<CsmUniform>::new(device);
        let scene_bind_group = BindGroupBuilder::new(scene_layout)
            .resource(csm_ubo.binding_resource())
            .texture(&shadow_maps.array_view)
            .sampler(&shadow_maps.sampler)
            .create(device, "CSM Scene Bind Group");

        let pass_ubos: Vec<_> = (0..layers)
            .map(|_| UniformBuffer::<ShadowPassUniform>::new(device))
            .collect();
        let pass_bind_groups = pass_ubos
            .iter()
            .enumerate()
            .map(|(i, ubo)| {
                BindGroupBuilder::new(pass_layout)
                    .resource(ubo.binding_resource())
                    .create(device, &format!("CSM Shadow Pass {} Bind Group", i))
            })
            .collect();

        Ok(Self {
            shadow_maps,
            csm_ubo,
            scene_bind_group,
            pass_ubos,
            pass_bind_groups,
        })
    }

    fn matches(&self, resolution: u32, layers: u32) -> bool {
        self.shadow_maps.resolution() == resolution && self.shadow_maps.layers() == layers
    }

    fn release(self) {
        self.shadow_maps.release();
    }
}

/// Cascade planner plus its shadow-map array and uniforms
pub struct CascadedShadowMaps {
    planner: CascadePlanner,
    options: ShadowOptions,
    scene_layout: BindGroupLayoutWithDesc,
    pass_layout: BindGroupLayoutWithDesc,
    resources: Option<CascadeResources>,
}

impl CascadedShadowMaps {
    /// Creates the bind group layouts; nothing is allocated until
    /// [`initialize`](Self::initialize).
    ///
    /// Scene layout: `0` [`CsmUniform`], `1` depth array, `2` comparison sampler.
    /// Shadow-pass layout: `0` [`ShadowPassUniform`].
    pub fn new(device: &wgpu::Device) -> Self {
        let scene_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .next_binding_fragment(binding_types::depth_texture_2d_array())
            .next_binding_fragment(binding_types::comparison_sampler())
            .create(device, "CSM Scene Bind Group Layout");

        let pass_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(device, "CSM Shadow Pass Bind Group Layout");

        Self {
            planner: CascadePlanner::new(),
            options: ShadowOptions::default(),
            scene_layout,
            pass_layout,
            resources: None,
        }
    }

    /// (Re)plans the cascades and (re)allocates the shadow-map array.
    ///
    /// The array is reused when resolution and cascade count are unchanged.
    /// Nothing is committed unless both planning and allocation succeed.
    pub fn initialize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: CascadeConfig,
        camera: &impl Camera,
        viewport: Viewport,
        light_direction: Vector3<f32>,
    ) -> Result<(), CsmError> {
        let mut candidate = self.planner.clone();
        candidate.initialize(config, camera, viewport, light_direction)?;

        let layers = config.split_count as u32;
        let resolution = config.shadow_map_resolution;
        let reuse = self
            .resources
            .as_ref()
            .is_some_and(|resources| resources.matches(resolution, layers));
        if !reuse {
            let fresh = CascadeResources::new(device, &self.scene_layout, &self.pass_layout, resolution, layers)
                .inspect_err(|err| log::warn!("Keeping previous shadow maps: {}", err))?;
            if let Some(old) = self.resources.replace(fresh) {
                old.release();
            }
        }

        self.planner = candidate;
        self.write_uniforms(queue, camera)
    }

    /// Per-frame refresh of the cascade matrices and uniforms.
    pub fn update(
        &mut self,
        queue: &wgpu::Queue,
        camera: &impl Camera,
        light_direction: Vector3<f32>,
    ) -> Result<(), CsmError> {
        if self.resources.is_none() {
            return Err(CsmError::Uninitialized);
        }
        self.planner.update(camera, light_direction)?;
        self.write_uniforms(queue, camera)
    }

    /// Takes effect on the next [`update`](Self::update).
    pub fn set_options(&mut self, options: ShadowOptions) {
        self.options = options;
    }

    /// Releases the shadow-map array and uniforms.
    ///
    /// The planner keeps its last cascade set; [`update`](Self::update)
    /// fails with [`CsmError::Uninitialized`] until the next
    /// [`initialize`](Self::initialize).
    pub fn shutdown(&mut self) {
        if let Some(resources) = self.resources.take() {
            resources.release();
        }
    }

    fn write_uniforms(&mut self, queue: &wgpu::Queue, camera: &impl Camera) -> Result<(), CsmError> {
        let resources = self.resources.as_mut().ok_or(CsmError::Uninitialized)?;
        let uniform = CsmUniform::from_planner(&self.planner, camera, self.options)?;
        resources.csm_ubo.update_content(queue, uniform);

        for (ubo, split) in resources.pass_ubos.iter_mut().zip(self.planner.cascades()) {
            ubo.update_content(queue, ShadowPassUniform::from(split.crop));
        }
        Ok(())
    }

    /// Starts a depth-only pass into cascade `index`, cleared to 1.0.
    ///
    /// The cascade's crop bind group is set at `group`.
    pub fn begin_shadow_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        index: usize,
        group: u32,
    ) -> Option<wgpu::RenderPass<'e>> {
        let resources = self.resources.as_ref()?;
        let view = resources.shadow_maps.layer_view(index)?;
        let bind_group = resources.pass_bind_groups.get(index)?;

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("CSM Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        pass.set_bind_group(group, bind_group, &[]);
        Some(pass)
    }

    pub fn planner(&self) -> &CascadePlanner {
        &self.planner
    }

    pub fn options(&self) -> ShadowOptions {
        self.options
    }

    pub fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }

    pub fn shadow_maps(&self) -> Option<&ShadowMapArray> {
        self.resources.as_ref().map(|resources| &resources.shadow_maps)
    }

    pub fn scene_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.scene_layout.layout
    }

    pub fn shadow_pass_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.pass_layout.layout
    }

    /// Uniform, depth array and sampler for the scene pass.
    pub fn scene_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.resources.as_ref().map(|resources| &resources.scene_bind_group)
    }

    /// Crop-matrix uniform for rendering cascade `index`.
    pub fn shadow_pass_bind_group(&self, index: usize) -> Option<&wgpu::BindGroup> {
        self.resources
            .as_ref()
            .and_then(|resources| resources.pass_bind_groups.get(index))
    }
}
