//! Headless cascade report
//!
//! Plans cascades for a fixed camera and light, prints the split table and,
//! when a GPU adapter is available, allocates the shadow-map array.
//!
//! ```text
//! RUST_LOG=debug cargo run --example cascade_report [stable]
//! ```

use anyhow::{anyhow, Context, Result};
use cascaded_shadows::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    let stable = std::env::args().any(|arg| arg == "stable");
    let config = CascadeConfig::default().with_stable(stable);
    let viewport = Viewport::new(1920, 1080);
    let light = Vector3::new(-1.0, -1.0, 0.0);
    let mut camera = FlyCamera::new(
        60.0,
        0.1,
        1000.0,
        viewport.aspect(),
        Vector3::new(0.0, 5.0, 20.0),
        Vector3::new(0.0, 0.0, -1.0),
    );

    let mut planner = CascadePlanner::new();
    planner
        .initialize(config, &camera, viewport, light)
        .context("initializing cascades")?;
    print_report(&planner, &camera);

    // One frame of movement to show what update does to the crop matrices
    camera.set_translation_delta(camera.forward(), 5.0);
    camera.set_rotation_delta(Vector3::new(0.0, 0.1, 0.0));
    planner.update(&camera, light)?;
    println!("\nafter moving 5 units and turning 0.1 rad:");
    print_report(&planner, &camera);

    if let Err(err) = allocate_on_gpu(config, &camera, viewport, light) {
        log::warn!("Skipping GPU allocation: {:#}", err);
    }
    Ok(())
}

fn print_report(planner: &CascadePlanner, camera: &FlyCamera) {
    let depths = planner.depth_far_bounds(&camera.projection_matrix());
    println!("cascade       near        far   depth far   light width");
    for (i, split) in planner.cascades().iter().enumerate() {
        let width = split
            .light_volume_corners()
            .map(|corners| (corners[3] - corners[0]).magnitude())
            .unwrap_or(f32::NAN);
        println!(
            "{:>7} {:>10.3} {:>10.3} {:>11.6} {:>13.3}",
            i, split.near, split.far, depths[i], width
        );
    }
}

fn allocate_on_gpu(
    config: CascadeConfig,
    camera: &FlyCamera,
    viewport: Viewport,
    light: Vector3<f32>,
) -> Result<()> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .map_err(|err| anyhow!("no adapter: {}", err))?;
    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("Cascade Report Device"),
        required_features: wgpu::Features::default(),
        required_limits: adapter.limits(),
        memory_hints: wgpu::MemoryHints::default(),
        trace: wgpu::Trace::Off,
    }))?;

    let mut csm = CascadedShadowMaps::new(&device);
    csm.initialize(&device, &queue, config, camera, viewport, light)?;
    if let Some(maps) = csm.shadow_maps() {
        println!(
            "\nallocated {} shadow map layers of {}x{} on {}",
            maps.layers(),
            maps.resolution(),
            maps.resolution(),
            adapter.get_info().name
        );
    }
    csm.shutdown();
    Ok(())
}
