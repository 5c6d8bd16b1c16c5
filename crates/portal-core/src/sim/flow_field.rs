//! Flow-field simulation
//!
//! Per-element state lives in the texels of two float render targets. Each
//! update renders a full-screen quad with the simulation shader, reading the
//! secondary target and writing the primary one, then the two swap roles.

use anyhow::{ensure, Result};
use wgpu::{BindGroup, Buffer, RenderPipeline};

use crate::gpu::{create_simulation_pipeline, GpuDevice, Layouts, RenderTarget, RenderTargetPair, Renderer, Slot, StateTexture};
use crate::scene::camera::OrthoCamera;
use crate::scene::plane::Plane;
use crate::sim::{seed_base_state, GridLayout};
use crate::{FlowFieldConfig, FlowFieldParams, TexturePrecision};

/// Offscreen scene the simulation pass renders: one unit quad, one camera
struct Environment {
    camera: OrthoCamera,
    plane: Plane,
    pipeline: RenderPipeline,
    params_buffer: Buffer,
}

/// GPU-resident particle state advanced one step per `update`
pub struct FlowField {
    layout: GridLayout,
    precision: TexturePrecision,
    base: StateTexture,
    targets: RenderTargetPair,
    environment: Environment,
    /// Indexed by the slot read as previous state
    bind_groups: [BindGroup; 2],
    uv_table: Vec<[f32; 2]>,
    uv_buffer: Buffer,
    params: FlowFieldParams,
    published: Option<Slot>,
}

impl FlowField {
    /// Create a flow field for `config.count` elements using `fragment` as the simulation rule
    ///
    /// `fragment` is a WGSL fragment stage following the binding contract in
    /// `portal_params::bindings`; `shaders::flow_field()` is the stock rule.
    pub fn new(gpu: &GpuDevice, layouts: &Layouts, config: &FlowFieldConfig, fragment: &str) -> Result<Self> {
        let layout = GridLayout::new(config.count)?;
        let max_dimension = gpu.device.limits().max_texture_dimension_2d;
        ensure!(
            layout.width <= max_dimension && layout.height <= max_dimension,
            "Flow field grid {}x{} exceeds the device texture limit of {}",
            layout.width,
            layout.height,
            max_dimension
        );
        let precision = config.precision;

        // Base state: seeded once, never written again
        let base = StateTexture::new(&gpu.device, "flow_field_base", layout.size(), precision, false);
        base.upload(&gpu.queue, &seed_base_state(&layout, config.seed))?;

        // Ping-pong surfaces; wgpu zero-initialises them, so the first
        // update reads an all-zero previous state
        let targets = RenderTargetPair::new(&gpu.device, layout.size(), precision);

        let camera = OrthoCamera::unit_quad();
        let params = FlowFieldParams::new(camera.view_proj().to_cols_array_2d(), layout.size());
        let environment = Environment {
            camera,
            plane: Plane::new(gpu, "flow_field_plane", 1.0, 1.0),
            pipeline: create_simulation_pipeline(gpu, layouts, fragment, targets.primary().target.format())?,
            params_buffer: gpu.create_uniform_buffer("flow_field_params", &params),
        };

        let bind_groups = [Slot::A, Slot::B].map(|previous| {
            gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(match previous {
                    Slot::A => "simulation_bg_read_a",
                    Slot::B => "simulation_bg_read_b",
                }),
                layout: &layouts.simulation,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(base.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(targets.get(previous).view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: environment.params_buffer.as_entire_binding(),
                    },
                ],
            })
        });

        let uv_table = layout.uv_table();
        let uv_buffer = gpu.create_buffer_with_data("flow_field_uv", wgpu::BufferUsages::VERTEX, &uv_table);

        log::info!(
            "Flow field: {} elements in a {}x{} {:?} grid ({} padding texels)",
            layout.count,
            layout.width,
            layout.height,
            precision,
            layout.padding()
        );

        Ok(Self {
            layout,
            precision,
            base,
            targets,
            environment,
            bind_groups,
            uv_table,
            uv_buffer,
            params,
            published: None,
        })
    }

    /// Advance the simulation by one step
    ///
    /// Renders into the primary target with the secondary one as previous
    /// state, swaps roles and publishes the freshly written surface. The
    /// renderer is back on its default target when this returns, whether
    /// the pass succeeded or not.
    pub fn update(&mut self, gpu: &GpuDevice, renderer: &mut Renderer, delta: f32) -> Result<()> {
        // committed to `self.params` only once the pass succeeded
        let params = self.params.advanced(delta);
        gpu.queue
            .write_buffer(&self.environment.params_buffer, 0, bytemuck::bytes_of(&params));

        let previous = self.targets.secondary_slot();
        let bind_group = &self.bind_groups[previous.index()];
        let environment = &self.environment;

        renderer.render_to(&self.targets.primary().target, |r| {
            let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("flow_field_encoder"),
            });
            {
                let mut pass = r.begin_pass(&mut encoder, "flow_field_pass", Some(wgpu::Color::TRANSPARENT))?;
                pass.set_pipeline(&environment.pipeline);
                pass.set_bind_group(0, bind_group, &[]);
                environment.plane.draw(&mut pass);
            }
            gpu.submit(encoder.finish());
            Ok(())
        })?;

        self.params = params;
        self.targets.swap();
        self.published = Some(self.targets.secondary_slot());

        log::debug!(
            "Flow field step {}: wrote {:?}, published {:?}",
            self.steps(),
            previous.other(),
            self.published
        );
        Ok(())
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn precision(&self) -> TexturePrecision {
        self.precision
    }

    /// Completed simulation steps
    pub fn steps(&self) -> u64 {
        self.targets.swaps()
    }

    /// Accumulated simulation time
    pub fn time(&self) -> f32 {
        self.params.time
    }

    pub fn camera(&self) -> &OrthoCamera {
        &self.environment.camera
    }

    pub fn base(&self) -> &StateTexture {
        &self.base
    }

    pub fn targets(&self) -> &RenderTargetPair {
        &self.targets
    }

    /// Slot holding the most recent state, `None` before the first update
    pub fn published_slot(&self) -> Option<Slot> {
        self.published
    }

    /// Most recent state texture, `None` before the first update
    pub fn texture(&self) -> Option<&RenderTarget> {
        self.published.map(|slot| &self.targets.get(slot).target)
    }

    pub fn uv_table(&self) -> &[[f32; 2]] {
        &self.uv_table
    }

    /// UV lookup table as a `Float32x2` vertex buffer
    pub fn uv_buffer(&self) -> &Buffer {
        &self.uv_buffer
    }

    /// Read back the published state; before the first update this is the
    /// zeroed secondary surface
    pub fn download(&self, gpu: &GpuDevice) -> Result<Vec<[f32; 4]>> {
        let slot = self.published.unwrap_or(self.targets.secondary_slot());
        self.targets.get(slot).download(gpu)
    }
}
