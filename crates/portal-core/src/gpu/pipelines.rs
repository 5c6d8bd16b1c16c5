use anyhow::Result;
use wgpu::{RenderPipeline, TextureFormat};

use crate::gpu::{GpuDevice, Layouts};
use crate::scene::plane::QuadVertex;
use crate::shaders;

/// Vertex layout of the per-particle UV attribute
fn uv_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

fn primitive(topology: wgpu::PrimitiveTopology) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    }
}

/// Create the flow-field simulation pipeline from a fragment source
///
/// `fragment` is appended to the shared prelude and must export `fs_main`.
/// Invalid WGSL or a binding mismatch is returned as an error.
pub fn create_simulation_pipeline(
    gpu: &GpuDevice,
    layouts: &Layouts,
    fragment: &str,
    format: TextureFormat,
) -> Result<RenderPipeline> {
    let source = shaders::simulation_module(fragment);

    gpu.validated("flow field simulation shader", |device| {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("simulation_shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("simulation_pl"),
            bind_group_layouts: &[&layouts.simulation],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("simulation_pipeline"),
            layout: Some(&pl),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[QuadVertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: crate::bindings::SIMULATION_ENTRY,
                // float targets are not blendable; every texel is overwritten
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: primitive(wgpu::PrimitiveTopology::TriangleList),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
    })
}

/// Create the particle point-list pipeline drawing into the visible scene
pub fn create_particles_pipeline(gpu: &GpuDevice, layouts: &Layouts, format: TextureFormat) -> Result<RenderPipeline> {
    gpu.validated("particles shader", |device| {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("particles_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::particles().into()),
        });

        let pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("particles_pl"),
            bind_group_layouts: &[&layouts.particles],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("particles_pipeline"),
            layout: Some(&pl),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[uv_vertex_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: primitive(wgpu::PrimitiveTopology::PointList),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
    })
}

/// Create the textured quad pipeline used by the debug plane
pub fn create_debug_plane_pipeline(gpu: &GpuDevice, layouts: &Layouts, format: TextureFormat) -> Result<RenderPipeline> {
    gpu.validated("debug plane shader", |device| {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("debug_plane_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::debug_plane().into()),
        });

        let pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("debug_plane_pl"),
            bind_group_layouts: &[&layouts.quad],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("debug_plane_pipeline"),
            layout: Some(&pl),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[QuadVertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: primitive(wgpu::PrimitiveTopology::TriangleList),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
    })
}
