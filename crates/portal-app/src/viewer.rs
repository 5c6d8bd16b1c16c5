//! Interactive viewer for the Portal flow field

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use wgpu::{Surface, SurfaceConfiguration};
use winit::{
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, Event, KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::EventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowBuilder},
};

use portal_core::{
    FrameContext, GpuDevice, Layouts, PerspectiveCamera, Portal, PortalConfig, RenderTarget, Renderer, Resources, World,
};

/// Longest step fed to the simulation, so a stalled window doesn't explode the field
const MAX_DELTA: f32 = 0.1;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.01,
    g: 0.01,
    b: 0.02,
    a: 1.0,
};

/// Main viewer state
pub struct Viewer {
    window: Arc<Window>,
    gpu: GpuDevice,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    layouts: Layouts,
    renderer: Renderer,
    camera: PerspectiveCamera,

    portal_config: PortalConfig,
    world: World<Portal>,
    resources: Option<Resources>,

    last_frame_time: Instant,
    frame_count: u64,
}

impl Viewer {
    pub async fn new(window: Arc<Window>, portal_config: PortalConfig, resource_root: PathBuf) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create window surface")?;
        let gpu = GpuDevice::request(instance, Some(&surface)).await?;

        let caps = surface.get_capabilities(&gpu.adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no supported formats"))?;

        let size = window.inner_size();
        let surface_config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: caps.present_modes[0],
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&gpu.device, &surface_config);

        let layouts = Layouts::new(&gpu.device);
        let (resources, events) = Resources::load(portal_config.resources.groups.clone(), resource_root)?;

        let mut camera = PerspectiveCamera::new(1.0);
        camera.set_aspect(surface_config.width, surface_config.height);

        Ok(Self {
            window,
            gpu,
            surface,
            surface_config,
            layouts,
            renderer: Renderer::new(),
            camera,
            portal_config,
            world: World::new(events),
            resources: Some(resources),
            last_frame_time: Instant::now(),
            frame_count: 0,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.surface_config.width = new_size.width;
            self.surface_config.height = new_size.height;
            self.surface.configure(&self.gpu.device, &self.surface_config);
            self.camera.set_aspect(new_size.width, new_size.height);
        }
    }

    /// Advance the world one frame and draw it to the window
    pub fn frame(&mut self) -> Result<()> {
        let now = Instant::now();
        let delta = (now - self.last_frame_time).as_secs_f32().min(MAX_DELTA);
        self.last_frame_time = now;

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.gpu.device, &self.surface_config);
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.renderer.set_default_target(RenderTarget::new(
            "surface",
            view,
            [self.surface_config.width, self.surface_config.height],
            self.surface_config.format,
        ));

        let layouts = &self.layouts;
        let portal_config = &self.portal_config;
        let format = self.surface_config.format;
        {
            let mut ctx = FrameContext::new(&self.gpu, &mut self.renderer, delta);
            self.world.update(&mut ctx, |ctx, store| {
                Portal::from_resources(ctx.gpu, layouts, portal_config, store, format)
            })?;
        }

        if !self.world.is_ready() && self.world.events_closed() {
            bail!("Resource loading finished without the base group");
        }
        if self.world.events_closed() {
            if let Some(resources) = self.resources.take() {
                resources.wait();
            }
        }

        if let Some(portal) = self.world.portal_mut() {
            portal.set_camera(&self.gpu.queue, self.camera.view_proj());
        }

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("surface_encoder"),
        });
        {
            let mut pass = self.renderer.begin_pass(&mut encoder, "surface_pass", Some(CLEAR_COLOR))?;
            if let Some(portal) = self.world.portal() {
                portal.render(&mut pass);
            }
        }
        self.gpu.submit(encoder.finish());

        self.renderer.clear_default_target();
        output.present();

        self.frame_count += 1;
        if self.frame_count % 600 == 0 {
            if let Some(portal) = self.world.portal() {
                log::debug!(
                    "Frame {}: {} simulation steps, t={:.2}s",
                    self.frame_count,
                    portal.flow_field().steps(),
                    portal.flow_field().time()
                );
            }
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: &Key) {
        match key {
            Key::Character(c) if c == "d" || c == "D" => {
                if let Some(debug_plane) = self.world.portal_mut().and_then(Portal::debug_plane_mut) {
                    debug_plane.visible = !debug_plane.visible;
                    log::info!("Debug plane: {}", if debug_plane.visible { "shown" } else { "hidden" });
                }
            }
            _ => {}
        }
    }

    pub fn handle_scroll(&mut self, delta: MouseScrollDelta) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
        };
        self.camera.dolly(1.1f32.powf(lines));
    }
}

/// Run the interactive viewer
pub async fn run_viewer(portal_config: PortalConfig, resource_root: PathBuf) -> Result<()> {
    let event_loop = EventLoop::new()?;

    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Portal")
            .with_inner_size(LogicalSize::new(1024.0, 768.0))
            .build(&event_loop)?,
    );

    let mut viewer = Viewer::new(window.clone(), portal_config, resource_root).await?;
    log::info!("Viewer created, press D to toggle the debug plane, Escape to quit");
    window.request_redraw();

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { ref event, window_id } if window_id == viewer.window.id() => match event {
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::Resized(physical_size) => {
                viewer.resize(*physical_size);
                viewer.window.request_redraw();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => elwt.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => viewer.handle_key(logical_key),
            WindowEvent::MouseWheel { delta, .. } => viewer.handle_scroll(*delta),
            WindowEvent::RedrawRequested => {
                if let Err(err) = viewer.frame() {
                    log::error!("Frame error: {:#}", err);
                    elwt.exit();
                }
            }
            _ => {}
        },
        Event::AboutToWait => viewer.window.request_redraw(),
        _ => {}
    })?;

    Ok(())
}
