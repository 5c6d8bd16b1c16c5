//! Shared parameter types for the Portal flow-field effect
//!
//! Configuration structures used by both the headless runner and the viewer,
//! plus the GPU uniform layouts the shaders expect.

use bytemuck::{Pod, Zeroable};

/// Fixed texel width of the flow-field grid
pub const FLOW_FIELD_WIDTH: u32 = 256;

/// Tallest grid the engine allocates, wgpu's default 2D texture limit
pub const MAX_FLOW_FIELD_ROWS: u32 = 8192;

/// Largest element count that fits a grid of `MAX_FLOW_FIELD_ROWS` rows
pub const MAX_FLOW_FIELD_COUNT: u32 = FLOW_FIELD_WIDTH * MAX_FLOW_FIELD_ROWS;

/// Name of the resource group whose completion brings the portal up
pub const BASE_GROUP: &str = "base";

/// Float precision of the simulation surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TexturePrecision {
    /// RGBA, 32-bit float per channel
    #[default]
    Full,
    /// RGBA, 16-bit float per channel
    Half,
}

impl TexturePrecision {
    /// Bytes per texel for this precision
    pub fn bytes_per_texel(self) -> u32 {
        match self {
            TexturePrecision::Full => 16,
            TexturePrecision::Half => 8,
        }
    }
}

/// Flow-field simulation parameters
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FlowFieldConfig {
    pub count: u32,
    pub seed: u64,
    pub precision: TexturePrecision,
}

/// Particle rendering parameters
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParticlesConfig {
    pub color: [f32; 3],
    pub scale: f32,
}

/// Diagnostic overlays
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DebugConfig {
    /// Show the flow-field texture on a quad in the visible scene
    pub plane: bool,
}

/// One file belonging to a resource group
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceItemConfig {
    pub name: String,
    pub path: String,
}

/// A named batch of files loaded together
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceGroupConfig {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub items: Vec<ResourceItemConfig>,
}

/// Resource groups in load order
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResourcesConfig {
    pub groups: Vec<ResourceGroupConfig>,
}

/// Frame loop settings for the hosts
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunConfig {
    pub frames: u32,
    pub snapshot_every: u32,
    pub delta: f32,
}

/// Complete Portal configuration
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PortalConfig {
    pub flow_field: FlowFieldConfig,
    pub particles: ParticlesConfig,
    pub debug: DebugConfig,
    pub resources: ResourcesConfig,
    pub run: RunConfig,
}

impl Default for FlowFieldConfig {
    fn default() -> Self {
        Self {
            count: 10_000,
            seed: 1337,
            precision: TexturePrecision::Full,
        }
    }
}

impl Default for ParticlesConfig {
    fn default() -> Self {
        Self {
            color: [0.55, 0.8, 1.0],
            scale: 1.0,
        }
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            groups: vec![ResourceGroupConfig {
                name: BASE_GROUP.to_string(),
                items: Vec::new(),
            }],
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            snapshot_every: 100,
            delta: 1.0 / 60.0,
        }
    }
}

impl PortalConfig {
    /// Check the configuration for values the engine cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.flow_field.count == 0 {
            return Err("flow_field.count must be greater than 0".to_string());
        }
        if self.flow_field.count > MAX_FLOW_FIELD_COUNT {
            return Err(format!(
                "flow_field.count must be at most {}, got {}",
                MAX_FLOW_FIELD_COUNT, self.flow_field.count
            ));
        }
        if self.run.frames == 0 {
            return Err("run.frames must be greater than 0".to_string());
        }
        if !(self.run.delta > 0.0) {
            return Err(format!("run.delta must be positive, got {}", self.run.delta));
        }
        if self.particles.scale <= 0.0 {
            return Err(format!("particles.scale must be positive, got {}", self.particles.scale));
        }

        let mut seen: Vec<&str> = Vec::with_capacity(self.resources.groups.len());
        for group in &self.resources.groups {
            if seen.contains(&group.name.as_str()) {
                return Err(format!("duplicate resource group '{}'", group.name));
            }
            seen.push(&group.name);
        }

        if !seen.contains(&BASE_GROUP) {
            log::warn!("No '{}' resource group configured; the portal will never be created", BASE_GROUP);
        }

        Ok(())
    }
}

/// GPU-compatible parameters for the flow-field simulation pass
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FlowFieldParams {
    pub view_proj: [[f32; 4]; 4],
    pub size: [u32; 2],
    pub time: f32,
    pub delta: f32,
}

impl FlowFieldParams {
    pub fn new(view_proj: [[f32; 4]; 4], size: [u32; 2]) -> Self {
        Self {
            view_proj,
            size,
            time: 0.0,
            delta: 0.0,
        }
    }

    /// Parameters for the next step, `delta` seconds later
    pub fn advanced(&self, delta: f32) -> Self {
        Self {
            time: self.time + delta,
            delta,
            ..*self
        }
    }
}

/// GPU-compatible parameters for the particle render pass
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ParticleParams {
    pub view_proj: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub grid: [f32; 2],
    pub scale: f32,
    pub _pad: f32,
}

impl ParticleParams {
    pub fn new(view_proj: [[f32; 4]; 4], config: &ParticlesConfig, grid: [u32; 2]) -> Self {
        Self {
            view_proj,
            color: [config.color[0], config.color[1], config.color[2], 1.0],
            grid: [grid[0] as f32, grid[1] as f32],
            scale: config.scale,
            _pad: 0.0,
        }
    }
}

/// GPU-compatible parameters for textured quads drawn in the visible scene
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct QuadParams {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
}

/// WGSL binding layout documentation
///
/// Every shader plugged into the engine has to declare exactly these
/// bindings; the pipeline layouts in `portal-core` are built to match.
pub mod bindings {
    /// Flow-field simulation bindings (group 0)
    ///
    /// ```wgsl
    /// @group(0) @binding(0) var base_tex: texture_2d<f32>;
    /// @group(0) @binding(1) var prev_tex: texture_2d<f32>;
    /// @group(0) @binding(2) var<uniform> params: FlowFieldParams;
    /// ```
    pub const FLOW_FIELD_BINDINGS: &str =
        "FlowField Group 0: baseTex(texture2D), prevTex(texture2D), FlowFieldParams(uniform)";

    /// Particle render bindings (group 0)
    ///
    /// ```wgsl
    /// @group(0) @binding(0) var<uniform> params: ParticleParams;
    /// @group(0) @binding(1) var state_tex: texture_2d<f32>;
    /// ```
    pub const PARTICLE_BINDINGS: &str = "Particles Group 0: ParticleParams(uniform), stateTex(texture2D)";

    /// Debug plane bindings (group 0)
    ///
    /// ```wgsl
    /// @group(0) @binding(0) var<uniform> params: QuadParams;
    /// @group(0) @binding(1) var map_tex: texture_2d<f32>;
    /// ```
    pub const DEBUG_PLANE_BINDINGS: &str = "DebugPlane Group 0: QuadParams(uniform), mapTex(texture2D)";

    /// Entry point every simulation fragment shader must export
    pub const SIMULATION_ENTRY: &str = "fs_main";

    /// Log binding layout information for debugging
    pub fn log_binding_layouts() {
        log::info!("FlowField Bindings: {}", FLOW_FIELD_BINDINGS);
        log::info!("Particle Bindings: {}", PARTICLE_BINDINGS);
        log::info!("DebugPlane Bindings: {}", DEBUG_PLANE_BINDINGS);
    }
}
