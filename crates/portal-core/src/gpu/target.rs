//! Render target binding
//!
//! Offscreen rendering goes through a scope: the target is bound for the
//! duration of a closure and the previous binding comes back afterwards,
//! whether the closure succeeded or not. Nothing outside a scope can leave
//! an offscreen surface bound.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use wgpu::{CommandEncoder, RenderPass, TextureFormat, TextureView};

/// Tracks which target draw calls currently go to
///
/// `None` means the default target.
#[derive(Debug)]
pub struct TargetBinding<T> {
    bound: Option<T>,
    depth: usize,
}

impl<T> Default for TargetBinding<T> {
    fn default() -> Self {
        Self { bound: None, depth: 0 }
    }
}

impl<T> TargetBinding<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently bound target, `None` when drawing to the default target
    pub fn current(&self) -> Option<&T> {
        self.bound.as_ref()
    }

    pub fn is_default(&self) -> bool {
        self.bound.is_none()
    }

    /// Number of nested scopes currently open
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Bind `target` while `f` runs, then restore whatever was bound before
    pub fn bind_scoped<R>(&mut self, target: T, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.enter(target);
        let result = f(self);
        self.exit(previous);
        result
    }

    fn enter(&mut self, target: T) -> Option<T> {
        self.depth += 1;
        self.bound.replace(target)
    }

    fn exit(&mut self, previous: Option<T>) {
        self.depth -= 1;
        self.bound = previous;
    }
}

/// A surface draw calls can be directed at
#[derive(Clone, Debug)]
pub struct RenderTarget {
    label: String,
    view: Arc<TextureView>,
    size: [u32; 2],
    format: TextureFormat,
}

impl RenderTarget {
    pub fn new(label: impl Into<String>, view: TextureView, size: [u32; 2], format: TextureFormat) -> Self {
        Self {
            label: label.into(),
            view: Arc::new(view),
            size,
            format,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Whether two handles refer to the same underlying view
    pub fn same_as(&self, other: &RenderTarget) -> bool {
        Arc::ptr_eq(&self.view, &other.view)
    }
}

/// Directs render passes at the default target or a scoped offscreen one
#[derive(Default)]
pub struct Renderer {
    targets: TargetBinding<RenderTarget>,
    default: Option<RenderTarget>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the visible target for this frame (swapchain view or headless canvas)
    pub fn set_default_target(&mut self, target: RenderTarget) {
        self.default = Some(target);
    }

    pub fn clear_default_target(&mut self) {
        self.default = None;
    }

    pub fn default_target(&self) -> Option<&RenderTarget> {
        self.default.as_ref()
    }

    /// Target the next render pass will draw into
    pub fn active_target(&self) -> Option<&RenderTarget> {
        self.targets.current().or(self.default.as_ref())
    }

    pub fn is_offscreen(&self) -> bool {
        !self.targets.is_default()
    }

    /// Label of the active target, mostly for logs and tests
    pub fn active_label(&self) -> Option<&str> {
        self.active_target().map(RenderTarget::label)
    }

    /// Render into `target` while `f` runs
    ///
    /// The previous target is restored on every exit path, including when `f`
    /// returns an error.
    pub fn render_to<R>(&mut self, target: &RenderTarget, f: impl FnOnce(&Renderer) -> Result<R>) -> Result<R> {
        let previous = self.targets.enter(target.clone());
        let result = f(self);
        self.targets.exit(previous);
        result
    }

    /// Begin a render pass on the active target
    ///
    /// `clear` of `None` keeps the existing contents.
    pub fn begin_pass<'e>(
        &'e self,
        encoder: &'e mut CommandEncoder,
        label: &str,
        clear: Option<wgpu::Color>,
    ) -> Result<RenderPass<'e>> {
        let target = self
            .active_target()
            .ok_or_else(|| anyhow!("No render target bound and no default target set"))?;

        let load = match clear {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        };

        Ok(encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        }))
    }
}
