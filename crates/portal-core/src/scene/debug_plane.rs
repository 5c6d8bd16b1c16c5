use anyhow::Result;
use glam::{Mat4, Vec3};
use wgpu::{BindGroup, Buffer, RenderPass, RenderPipeline, TextureFormat};

use crate::gpu::{create_debug_plane_pipeline, GpuDevice, Layouts, Slot};
use crate::scene::plane::Plane;
use crate::sim::FlowField;
use crate::QuadParams;

/// Diagnostic quad showing the current flow-field texture in the visible scene
///
/// Same aspect as the simulation grid. Has no effect on the simulation.
pub struct DebugPlane {
    plane: Plane,
    pipeline: RenderPipeline,
    params: QuadParams,
    params_buffer: Buffer,
    bind_groups: [BindGroup; 2],
    map: Option<Slot>,
    pub visible: bool,
}

impl DebugPlane {
    pub fn new(gpu: &GpuDevice, layouts: &Layouts, flow_field: &FlowField, format: TextureFormat) -> Result<Self> {
        let plane = Plane::new(gpu, "debug_plane", 1.0, flow_field.layout().aspect());
        let params = QuadParams {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let params_buffer = gpu.create_uniform_buffer("debug_plane_params", &params);

        let bind_groups = [Slot::A, Slot::B].map(|slot| {
            gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(match slot {
                    Slot::A => "debug_plane_bg_a",
                    Slot::B => "debug_plane_bg_b",
                }),
                layout: &layouts.quad,
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
            plane,
            pipeline: create_debug_plane_pipeline(gpu, layouts, format)?,
            params,
            params_buffer,
            bind_groups,
            map: None,
            visible: true,
        })
    }

    pub fn set_map(&mut self, slot: Option<Slot>) {
        self.map = slot;
    }

    /// Slot currently displayed
    pub fn map(&self) -> Option<Slot> {
        self.map
    }

    pub fn set_transform(&mut self, queue: &wgpu::Queue, view_proj: Mat4, position: Vec3) {
        self.params.view_proj = view_proj.to_cols_array_2d();
        self.params.model = Mat4::from_translation(position).to_cols_array_2d();
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&self.params));
    }

    pub fn render<'a>(&'a self, pass: &mut RenderPass<'a>) {
        let Some(slot) = self.map else {
            return;
        };
        if !self.visible {
            return;
        }

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_groups[slot.index()], &[]);
        self.plane.draw(pass);
    }
}
