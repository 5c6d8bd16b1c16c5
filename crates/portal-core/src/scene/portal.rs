use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use wgpu::{RenderPass, TextureFormat};

use crate::gpu::{GpuDevice, Layouts};
use crate::scene::{DebugPlane, FrameContext, Particles, ResourceStore, Update};
use crate::shaders;
use crate::sim::FlowField;
use crate::{PortalConfig, BASE_GROUP};

/// Item in the base group that replaces the stock simulation rule
pub const FLOW_FIELD_SHADER_ITEM: &str = "flow_field_shader";

/// Where the debug plane sits in the visible scene
const DEBUG_PLANE_POSITION: Vec3 = Vec3::new(0.0, -0.75, 0.0);

/// The portal effect: a flow field and the particles it moves
pub struct Portal {
    flow_field: FlowField,
    particles: Particles,
    debug_plane: Option<DebugPlane>,
}

impl Portal {
    pub fn new(
        gpu: &GpuDevice,
        layouts: &Layouts,
        config: &PortalConfig,
        simulation_shader: &str,
        format: TextureFormat,
    ) -> Result<Self> {
        let flow_field = FlowField::new(gpu, layouts, &config.flow_field, simulation_shader)?;
        let particles = Particles::new(gpu, layouts, &flow_field, &config.particles, format)?;
        let debug_plane = if config.debug.plane {
            Some(DebugPlane::new(gpu, layouts, &flow_field, format)?)
        } else {
            None
        };

        log::info!(
            "Portal ready: {} particles, debug plane {}",
            particles.count(),
            if debug_plane.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            flow_field,
            particles,
            debug_plane,
        })
    }

    /// Build the portal from loaded resources
    ///
    /// Uses the base group's `flow_field_shader` item when present, the
    /// stock flow-field rule otherwise.
    pub fn from_resources(
        gpu: &GpuDevice,
        layouts: &Layouts,
        config: &PortalConfig,
        resources: &ResourceStore,
        format: TextureFormat,
    ) -> Result<Self> {
        match resources.get(BASE_GROUP, FLOW_FIELD_SHADER_ITEM) {
            Some(bytes) => {
                let source = std::str::from_utf8(bytes)
                    .with_context(|| format!("{}/{} is not valid UTF-8", BASE_GROUP, FLOW_FIELD_SHADER_ITEM))?;
                log::info!("Using simulation shader from resources ({} bytes)", bytes.len());
                Self::new(gpu, layouts, config, source, format)
            }
            None => Self::new(gpu, layouts, config, shaders::flow_field(), format),
        }
    }

    /// Step the flow field and hand its output to the particles
    pub fn update(&mut self, ctx: &mut FrameContext<'_>) -> Result<()> {
        self.flow_field.update(ctx.gpu, ctx.renderer, ctx.delta)?;

        let published = self.flow_field.published_slot();
        self.particles.set_texture(published);
        if let Some(debug_plane) = &mut self.debug_plane {
            debug_plane.set_map(published);
        }
        Ok(())
    }

    /// Point every visible object at the scene camera
    pub fn set_camera(&mut self, queue: &wgpu::Queue, view_proj: Mat4) {
        self.particles.set_view_proj(queue, view_proj);
        if let Some(debug_plane) = &mut self.debug_plane {
            debug_plane.set_transform(queue, view_proj, DEBUG_PLANE_POSITION);
        }
    }

    /// Draw into whatever target `pass` was opened on
    pub fn render<'a>(&'a self, pass: &mut RenderPass<'a>) {
        self.particles.render(pass, self.flow_field.uv_buffer());
        if let Some(debug_plane) = &self.debug_plane {
            debug_plane.render(pass);
        }
    }

    pub fn flow_field(&self) -> &FlowField {
        &self.flow_field
    }

    pub fn particles(&self) -> &Particles {
        &self.particles
    }

    pub fn debug_plane(&self) -> Option<&DebugPlane> {
        self.debug_plane.as_ref()
    }

    pub fn debug_plane_mut(&mut self) -> Option<&mut DebugPlane> {
        self.debug_plane.as_mut()
    }
}

impl Update<FrameContext<'_>> for Portal {
    fn update(&mut self, ctx: &mut FrameContext<'_>) -> Result<()> {
        Portal::update(self, ctx)
    }
}
