//! Portal Core Engine
//!
//! Ping-pong flow-field simulation on the GPU, the particle system it drives,
//! and the scene lifecycle that brings the portal up once resources load.

pub mod gpu;
pub mod scene;
pub mod shaders;
pub mod sim;

// Re-export main types
pub use gpu::*;
pub use scene::*;
pub use sim::*;

// Re-export params from portal-params
pub use portal_params::*;
