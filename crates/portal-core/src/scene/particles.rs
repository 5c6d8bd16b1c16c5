use anyhow::Result;
use glam::Mat4;
use wgpu::{BindGroup, Buffer, RenderPass, RenderPipeline, TextureFormat};

use crate::gpu::{create_particles_pipeline, GpuDevice, Layouts, Slot};
use crate::sim::FlowField;
use crate::{ParticleParams, ParticlesConfig};

/// Points positioned by the flow-field state texture
///
/// Each vertex carries its element's UV; the vertex shader fetches the state
/// texel there every frame, so publishing a new texture is just picking the
/// bind group for its slot.
pub struct Particles {
    count: u32,
    pipeline: RenderPipeline,
    params: ParticleParams,
    params_buffer: Buffer,
    bind_groups: [BindGroup; 2],
    map: Option<Slot>,
}

impl Particles {
    pub fn new(
        gpu: &GpuDevice,
        layouts: &Layouts,
        flow_field: &FlowField,
        config: &ParticlesConfig,
        format: TextureFormat,
    ) -> Result<Self> {
        let grid = flow_field.layout();
        let params = ParticleParams::new(Mat4::IDENTITY.to_cols_array_2d(), config, grid.size());
        let params_buffer = gpu.create_uniform_buffer("particle_params", &params);

        let bind_groups = [Slot::A, Slot::B].map(|slot| {
            gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(match slot {
                    Slot::A => "particles_bg_a",
                    Slot::B => "particles_bg_b",
                }),
                layout: &layouts.particles,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: params_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(flow_field.targets().get(slot).view()),
                    },
                ],
            })
        });

        Ok(Self {
            count: grid.count,
            pipeline: create_particles_pipeline(gpu, layouts, format)?,
            params,
            params_buffer,
            bind_groups,
            map: None,
        })
    }

    /// Sample state from `slot` from now on
    pub fn set_texture(&mut self, slot: Option<Slot>) {
        self.map = slot;
    }

    pub fn texture(&self) -> Option<Slot> {
        self.map
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn set_view_proj(&mut self, queue: &wgpu::Queue, view_proj: Mat4) {
        self.params.view_proj = view_proj.to_cols_array_2d();
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&self.params));
    }

    /// Draw one point per element; nothing is drawn until a texture is set
    pub fn render<'a>(&'a self, pass: &mut RenderPass<'a>, uv_buffer: &'a Buffer) {
        let Some(slot) = self.map else {
            return;
        };

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_groups[slot.index()], &[]);
        pass.set_vertex_buffer(0, uv_buffer.slice(..));
        pass.draw(0..self.count, 0..1);
    }
}
