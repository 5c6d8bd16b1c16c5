mod metrics;
mod snapshots;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use portal_core::{
    Canvas, FrameContext, GpuDevice, Layouts, PerspectiveCamera, Portal, PortalConfig, Renderer, Resources, StateStats,
    World,
};

use metrics::MetricsWriter;
use snapshots::SnapshotWriter;

/// Size of the offscreen canvas standing in for a window
const CANVAS_SIZE: [u32; 2] = [512, 512];

/// How long to wait for resources before giving up
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "portal-headless")]
#[command(about = "Run the Portal flow field offscreen and write snapshots")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Output directory for results
    #[arg(short, long, value_name = "DIR")]
    out: PathBuf,

    /// Override the configured number of frames
    #[arg(long)]
    frames: Option<u32>,
}

fn load_config(path: &Path) -> Result<PortalConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let config: PortalConfig =
        serde_yaml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
    if let Err(err) = config.validate() {
        bail!("Invalid configuration: {}", err);
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    log::info!("Loading configuration from {}", cli.config.display());
    let mut config = load_config(&cli.config)?;
    if let Some(frames) = cli.frames {
        if frames == 0 {
            bail!("Frame count must be greater than 0.");
        }
        config.run.frames = frames;
    }

    std::fs::create_dir_all(&cli.out)?;

    let gpu = pollster::block_on(GpuDevice::new())?;
    let layouts = Layouts::new(&gpu.device);
    let canvas = Canvas::new(&gpu.device, CANVAS_SIZE);
    let mut renderer = Renderer::new();
    renderer.set_default_target(canvas.target.clone());

    // Resource paths are relative to the config file
    let root = cli
        .config
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();
    let (resources, events) = Resources::load(config.resources.groups.clone(), root)?;
    let mut world: World<Portal> = World::new(events);

    let mut metrics_writer = MetricsWriter::new(&cli.out)?;
    let snapshot_writer = SnapshotWriter::new(&cli.out)?;

    let run = config.run.clone();
    log::info!("Running {} frames, snapshot every {}", run.frames, run.snapshot_every);

    let camera = PerspectiveCamera::new(CANVAS_SIZE[0] as f32 / CANVAS_SIZE[1] as f32);

    let start_time = Instant::now();
    let load_start = Instant::now();
    let mut frame = 0u32;

    while frame < run.frames {
        let frame_start = Instant::now();

        {
            let mut ctx = FrameContext::new(&gpu, &mut renderer, run.delta);
            world.update(&mut ctx, |ctx, store| {
                Portal::from_resources(ctx.gpu, &layouts, &config, store, Canvas::FORMAT)
            })?;
        }

        if !world.is_ready() {
            if world.events_closed() {
                bail!("Resource loading finished without the base group; see the errors above");
            }
            if load_start.elapsed() > LOAD_TIMEOUT {
                bail!("Timed out waiting for resources");
            }
            std::thread::sleep(Duration::from_millis(1));
            continue;
        }
        let Some(portal) = world.portal_mut() else {
            continue;
        };

        portal.set_camera(&gpu.queue, camera.view_proj());
        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("canvas_encoder"),
        });
        {
            let mut pass = renderer.begin_pass(&mut encoder, "canvas_pass", Some(wgpu::Color::BLACK))?;
            portal.render(&mut pass);
        }
        gpu.submit(encoder.finish());
        frame += 1;

        let snapshot_due = run.snapshot_every > 0 && frame % run.snapshot_every == 0;
        if snapshot_due || frame == run.frames {
            let flow_field = portal.flow_field();
            let texels = flow_field.download(&gpu)?;
            let stats = StateStats::from_texels(&texels, flow_field.layout().count);
            let frame_time = frame_start.elapsed();

            metrics_writer.write_step(frame, flow_field.time(), &stats, frame_time)?;
            snapshot_writer.write_state_snapshot(frame, flow_field.layout(), &texels)?;
            snapshot_writer.write_canvas_snapshot(frame, CANVAS_SIZE, &canvas.download(&gpu)?)?;

            log::info!(
                "Frame {}: mean=({:.3}, {:.3}, {:.3}, {:.3}), time={:?}",
                frame,
                stats.mean[0],
                stats.mean[1],
                stats.mean[2],
                stats.mean[3],
                frame_time
            );
        }
    }

    resources.wait();
    log::info!("Completed {} frames in {:?}", frame, start_time.elapsed());
    log::info!("Results written to {}", cli.out.display());

    Ok(())
}
