use bytemuck::{Pod, Zeroable};
use wgpu::RenderPass;

use crate::gpu::GpuDevice;

/// Vertex of a textured plane
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl QuadVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Corners of a `width x height` plane centred on the origin in the XY plane
///
/// UV (0, 0) is the top-left corner so `uv * size` addresses texture rows in
/// memory order.
pub fn plane_vertices(width: f32, height: f32) -> [QuadVertex; 4] {
    let hw = width / 2.0;
    let hh = height / 2.0;
    [
        QuadVertex { position: [-hw, hh, 0.0], uv: [0.0, 0.0] },
        QuadVertex { position: [-hw, -hh, 0.0], uv: [0.0, 1.0] },
        QuadVertex { position: [hw, -hh, 0.0], uv: [1.0, 1.0] },
        QuadVertex { position: [hw, hh, 0.0], uv: [1.0, 0.0] },
    ]
}

/// Two counter-clockwise triangles over `plane_vertices`
pub const PLANE_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Plane geometry uploaded to the GPU
pub struct Plane {
    pub width: f32,
    pub height: f32,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
}

impl Plane {
    pub fn new(gpu: &GpuDevice, label: &str, width: f32, height: f32) -> Self {
        let vertices = plane_vertices(width, height);

        let vertex_buffer = gpu.create_buffer_with_data(
            &format!("{}_vertices", label),
            wgpu::BufferUsages::VERTEX,
            &vertices,
        );
        let index_buffer = gpu.create_buffer_with_data(
            &format!("{}_indices", label),
            wgpu::BufferUsages::INDEX,
            &PLANE_INDICES,
        );

        Self {
            width,
            height,
            vertex_buffer,
            index_buffer,
            num_indices: PLANE_INDICES.len() as u32,
        }
    }

    /// Record the draw; pipeline and bind groups must already be set
    pub fn draw<'a>(&'a self, pass: &mut RenderPass<'a>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.num_indices, 0, 0..1);
    }
}
