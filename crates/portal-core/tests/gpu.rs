//! GPU integration tests
//!
//! Each test returns early when no adapter is available so the suite still
//! passes on machines without a GPU or software rasterizer.

use anyhow::bail;
use portal_core::*;

/// Fragment rule writing a constant red state into every texel
const RED_RULE: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.0, 0.0, 1.0);
}
"#;

/// Fragment rule adding one to the red channel of the previous state
const COUNTER_RULE: &str = r#"
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let previous = textureLoad(prev_tex, texel_coord(in), 0);
    return vec4<f32>(previous.r + 1.0, 0.0, 0.0, 1.0);
}
"#;

fn gpu() -> Option<GpuDevice> {
    match pollster::block_on(GpuDevice::new()) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("skipping GPU test: {}", err);
            None
        }
    }
}

fn flow_field_config(count: u32, precision: TexturePrecision) -> FlowFieldConfig {
    FlowFieldConfig {
        count,
        precision,
        ..Default::default()
    }
}

fn canvas_renderer(gpu: &GpuDevice, size: [u32; 2]) -> (Canvas, Renderer) {
    let canvas = Canvas::new(&gpu.device, size);
    let mut renderer = Renderer::new();
    renderer.set_default_target(canvas.target.clone());
    (canvas, renderer)
}

fn pixel(bytes: &[u8], size: [u32; 2], x: u32, y: u32) -> [u8; 4] {
    let i = ((y * size[0] + x) * 4) as usize;
    [bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]
}

#[test]
fn constant_rule_fills_every_texel() {
    let Some(gpu) = gpu() else { return };
    let layouts = Layouts::new(&gpu.device);
    let (_canvas, mut renderer) = canvas_renderer(&gpu, [16, 16]);

    let mut flow_field =
        FlowField::new(&gpu, &layouts, &flow_field_config(10_000, TexturePrecision::Full), RED_RULE).unwrap();
    assert_eq!(flow_field.layout().size(), [256, 40]);
    assert!(flow_field.texture().is_none());

    for _ in 0..3 {
        flow_field.update(&gpu, &mut renderer, 1.0 / 60.0).unwrap();
    }

    let texels = flow_field.download(&gpu).unwrap();
    assert_eq!(texels.len(), 256 * 40);
    assert!(texels.iter().all(|t| *t == [1.0, 0.0, 0.0, 1.0]));
    assert_eq!(flow_field.steps(), 3);
}

#[test]
fn previous_state_starts_at_zero_and_accumulates() {
    let Some(gpu) = gpu() else { return };
    let layouts = Layouts::new(&gpu.device);
    let (_canvas, mut renderer) = canvas_renderer(&gpu, [16, 16]);

    let mut flow_field =
        FlowField::new(&gpu, &layouts, &flow_field_config(100, TexturePrecision::Full), COUNTER_RULE).unwrap();

    for step in 1..=5 {
        flow_field.update(&gpu, &mut renderer, 0.1).unwrap();
        let texels = flow_field.download(&gpu).unwrap();
        assert!(texels.iter().all(|t| t[0] == step as f32), "step {}", step);
    }
}

#[test]
fn roles_alternate_and_published_is_last_written() {
    let Some(gpu) = gpu() else { return };
    let layouts = Layouts::new(&gpu.device);
    let (_canvas, mut renderer) = canvas_renderer(&gpu, [16, 16]);

    let mut flow_field =
        FlowField::new(&gpu, &layouts, &flow_field_config(64, TexturePrecision::Full), RED_RULE).unwrap();

    for _ in 0..4 {
        let written = flow_field.targets().primary_slot();
        flow_field.update(&gpu, &mut renderer, 0.1).unwrap();

        assert_eq!(flow_field.published_slot(), Some(written));
        assert_eq!(flow_field.targets().secondary_slot(), written);
        assert_eq!(flow_field.targets().primary_slot(), written.other());
        assert!(flow_field
            .texture()
            .unwrap()
            .same_as(&flow_field.targets().get(written).target));
    }
}

#[test]
fn update_restores_default_target() {
    let Some(gpu) = gpu() else { return };
    let layouts = Layouts::new(&gpu.device);
    let size = [8, 8];
    let (canvas, mut renderer) = canvas_renderer(&gpu, size);

    let mut flow_field =
        FlowField::new(&gpu, &layouts, &flow_field_config(32, TexturePrecision::Full), RED_RULE).unwrap();
    flow_field.update(&gpu, &mut renderer, 0.1).unwrap();

    assert!(!renderer.is_offscreen());
    assert_eq!(renderer.active_label(), Some("canvas"));
    assert!(renderer.active_target().unwrap().same_as(&canvas.target));

    // A pass opened now lands on the canvas, not on the simulation state
    let mut encoder = gpu.device.create_command_encoder(&Default::default());
    {
        let _pass = renderer
            .begin_pass(&mut encoder, "clear_green", Some(wgpu::Color::GREEN))
            .unwrap();
    }
    gpu.submit(encoder.finish());

    let bytes = canvas.download(&gpu).unwrap();
    assert_eq!(pixel(&bytes, size, 4, 4), [0, 255, 0, 255]);
    let texels = flow_field.download(&gpu).unwrap();
    assert!(texels.iter().all(|t| *t == [1.0, 0.0, 0.0, 1.0]));
}

#[test]
fn render_to_restores_target_after_error() {
    let Some(gpu) = gpu() else { return };
    let (canvas, mut renderer) = canvas_renderer(&gpu, [8, 8]);
    let offscreen = StateTexture::new(&gpu.device, "offscreen", [4, 4], TexturePrecision::Full, true);

    let result: anyhow::Result<()> = renderer.render_to(&offscreen.target, |r| {
        assert!(r.is_offscreen());
        assert_eq!(r.active_label(), Some("offscreen"));
        bail!("draw failed")
    });

    assert!(result.is_err());
    assert!(!renderer.is_offscreen());
    assert!(renderer.active_target().unwrap().same_as(&canvas.target));
}

#[test]
fn swap_exchanges_roles_without_copying() {
    let Some(gpu) = gpu() else { return };
    let size = [4, 2];
    let mut pair = RenderTargetPair::new(&gpu.device, size, TexturePrecision::Full);

    let pattern: Vec<[f32; 4]> = (0..8).map(|i| [i as f32, 0.5, -1.0, 2.0]).collect();
    pair.secondary().upload(&gpu.queue, &pattern).unwrap();
    let secondary = pair.secondary_slot();

    pair.swap();

    assert_eq!(pair.primary_slot(), secondary);
    assert_eq!(pair.primary().download(&gpu).unwrap(), pattern);
    assert!(pair.secondary().download(&gpu).unwrap().iter().all(|t| *t == [0.0; 4]));
}

#[test]
fn half_precision_round_trips_through_the_pipeline() {
    let Some(gpu) = gpu() else { return };
    let layouts = Layouts::new(&gpu.device);
    let (_canvas, mut renderer) = canvas_renderer(&gpu, [8, 8]);

    let mut flow_field =
        FlowField::new(&gpu, &layouts, &flow_field_config(300, TexturePrecision::Half), COUNTER_RULE).unwrap();
    assert_eq!(flow_field.targets().primary().target.format(), wgpu::TextureFormat::Rgba16Float);

    flow_field.update(&gpu, &mut renderer, 0.1).unwrap();
    flow_field.update(&gpu, &mut renderer, 0.1).unwrap();

    let texels = flow_field.download(&gpu).unwrap();
    assert!(texels.iter().all(|t| *t == [2.0, 0.0, 0.0, 1.0]));
}

#[test]
fn invalid_shader_is_an_error() {
    let Some(gpu) = gpu() else { return };
    let layouts = Layouts::new(&gpu.device);

    let result = FlowField::new(
        &gpu,
        &layouts,
        &flow_field_config(16, TexturePrecision::Full),
        "@fragment fn fs_main() -> @location(0) vec4<f32> { return undefined_value; }",
    );
    assert!(result.is_err());
}

#[test]
fn oversized_flow_field_is_an_error() {
    let Some(gpu) = gpu() else { return };
    let layouts = Layouts::new(&gpu.device);

    let result = FlowField::new(
        &gpu,
        &layouts,
        &flow_field_config(256 * 9000, TexturePrecision::Full),
        RED_RULE,
    );
    assert!(result.is_err());
}

#[test]
fn time_advances_with_completed_steps() {
    let Some(gpu) = gpu() else { return };
    let layouts = Layouts::new(&gpu.device);
    let (_canvas, mut renderer) = canvas_renderer(&gpu, [8, 8]);

    let mut flow_field =
        FlowField::new(&gpu, &layouts, &flow_field_config(16, TexturePrecision::Full), RED_RULE).unwrap();
    assert_eq!(flow_field.time(), 0.0);

    for step in 1..=4u64 {
        flow_field.update(&gpu, &mut renderer, 0.25).unwrap();
        assert_eq!(flow_field.steps(), step);
        assert_eq!(flow_field.time(), 0.25 * step as f32);
    }
}

#[test]
fn stock_rule_keeps_particles_alive() {
    let Some(gpu) = gpu() else { return };
    let layouts = Layouts::new(&gpu.device);
    let (_canvas, mut renderer) = canvas_renderer(&gpu, [8, 8]);
    let count = 500;

    let mut flow_field = FlowField::new(
        &gpu,
        &layouts,
        &flow_field_config(count, TexturePrecision::Full),
        shaders::flow_field(),
    )
    .unwrap();
    for _ in 0..10 {
        flow_field.update(&gpu, &mut renderer, 1.0 / 60.0).unwrap();
    }

    let texels = flow_field.download(&gpu).unwrap();
    let stats = StateStats::from_texels(&texels, count);
    assert_eq!(stats.count, count);
    // expired particles carry alpha just past 1 for one step before respawning
    assert!(stats.min[3] > 0.0 && stats.max[3] < 1.01);
    assert!(texels[..count as usize].iter().all(|t| t.iter().all(|v| v.is_finite())));
}

#[test]
fn portal_publishes_to_particles_and_debug_plane() {
    let Some(gpu) = gpu() else { return };
    let layouts = Layouts::new(&gpu.device);
    let size = [64, 64];
    let (canvas, mut renderer) = canvas_renderer(&gpu, size);

    let mut config = PortalConfig::default();
    config.flow_field.count = 10_000;
    config.debug.plane = true;

    let mut portal = Portal::new(&gpu, &layouts, &config, RED_RULE, Canvas::FORMAT).unwrap();
    assert!(portal.particles().texture().is_none());

    {
        let mut ctx = FrameContext::new(&gpu, &mut renderer, 1.0 / 60.0);
        portal.update(&mut ctx).unwrap();
        portal.update(&mut ctx).unwrap();
    }

    let published = portal.flow_field().published_slot();
    assert!(published.is_some());
    assert_eq!(portal.particles().texture(), published);
    assert_eq!(portal.debug_plane().unwrap().map(), published);

    // Identity camera: the debug plane covers the canvas centre
    let mut encoder = gpu.device.create_command_encoder(&Default::default());
    {
        let mut pass = renderer
            .begin_pass(&mut encoder, "portal_test", Some(wgpu::Color::BLACK))
            .unwrap();
        portal.render(&mut pass);
    }
    gpu.submit(encoder.finish());

    let bytes = canvas.download(&gpu).unwrap();
    assert_eq!(pixel(&bytes, size, 32, 32), [255, 0, 0, 255]);
}

#[test]
fn world_builds_portal_from_loaded_resources() {
    let Some(gpu) = gpu() else { return };
    let layouts = Layouts::new(&gpu.device);
    let (_canvas, mut renderer) = canvas_renderer(&gpu, [8, 8]);
    let config = PortalConfig::default();

    let (tx, rx) = std::sync::mpsc::channel();
    let mut world: World<Portal> = World::new(rx);

    tx.send(ResourceEvent::ItemLoaded {
        group: BASE_GROUP.to_string(),
        item: FLOW_FIELD_SHADER_ITEM.to_string(),
        data: RED_RULE.as_bytes().to_vec(),
    })
    .unwrap();
    tx.send(ResourceEvent::GroupEnd {
        name: BASE_GROUP.to_string(),
    })
    .unwrap();

    let mut ctx = FrameContext::new(&gpu, &mut renderer, 0.1);
    world
        .update(&mut ctx, |ctx, store| {
            Portal::from_resources(ctx.gpu, &layouts, &config, store, Canvas::FORMAT)
        })
        .unwrap();

    let portal = world.portal().unwrap();
    assert_eq!(portal.flow_field().steps(), 1);
    let texels = portal.flow_field().download(&gpu).unwrap();
    assert!(texels.iter().all(|t| *t == [1.0, 0.0, 0.0, 1.0]));
}
