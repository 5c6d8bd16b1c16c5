use wgpu::{BindGroupLayout, Device};

/// Centralized registry that owns all bind group layouts
///
/// Components borrow the layouts by reference when creating pipelines and
/// bind groups, so every pass agrees on the binding contract documented in
/// `portal_params::bindings`.
pub struct Layouts {
    /// Flow-field simulation pass (base texture, previous state, params)
    pub simulation: BindGroupLayout,

    /// Particle render pass (params, state texture)
    pub particles: BindGroupLayout,

    /// Textured quad in the visible scene (params, map texture)
    pub quad: BindGroupLayout,
}

impl Layouts {
    /// Create all bind group layouts once
    pub fn new(device: &Device) -> Self {
        Self {
            simulation: Self::create_simulation_layout(device),
            particles: Self::create_particles_layout(device),
            quad: Self::create_quad_layout(device),
        }
    }

    fn state_texture_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        }
    }

    fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    fn create_simulation_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("simulation_bgl"),
            entries: &[
                // @binding(0) base state texture
                Self::state_texture_entry(0, wgpu::ShaderStages::FRAGMENT),
                // @binding(1) previous state texture
                Self::state_texture_entry(1, wgpu::ShaderStages::FRAGMENT),
                // @binding(2) FlowFieldParams uniform buffer
                Self::uniform_entry(2, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
            ],
        })
    }

    fn create_particles_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("particles_bgl"),
            entries: &[
                // @binding(0) ParticleParams uniform buffer
                Self::uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
                // @binding(1) state texture, fetched per vertex
                Self::state_texture_entry(1, wgpu::ShaderStages::VERTEX),
            ],
        })
    }

    fn create_quad_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quad_bgl"),
            entries: &[
                // @binding(0) QuadParams uniform buffer
                Self::uniform_entry(0, wgpu::ShaderStages::VERTEX),
                // @binding(1) map texture
                Self::state_texture_entry(1, wgpu::ShaderStages::FRAGMENT),
            ],
        })
    }
}
