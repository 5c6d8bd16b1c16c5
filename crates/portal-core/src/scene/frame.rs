use anyhow::Result;

use crate::gpu::{GpuDevice, Renderer};

/// Something advanced once per displayed frame
///
/// `C` is whatever the frame needs; the GPU objects implement it for
/// `FrameContext`, lifecycle tests use plain values.
pub trait Update<C: ?Sized> {
    fn update(&mut self, ctx: &mut C) -> Result<()>;
}

/// Per-frame handles passed down the scene
pub struct FrameContext<'a> {
    pub gpu: &'a GpuDevice,
    pub renderer: &'a mut Renderer,
    /// Seconds since the previous frame
    pub delta: f32,
}

impl<'a> FrameContext<'a> {
    pub fn new(gpu: &'a GpuDevice, renderer: &'a mut Renderer, delta: f32) -> Self {
        Self { gpu, renderer, delta }
    }
}
