use anyhow::{anyhow, Context, Result};
use wgpu::util::DeviceExt;
use wgpu::{Adapter, Device, Instance, Queue, RequestAdapterOptions, Surface};

/// GPU device manager shared by the simulation and the visible scene
pub struct GpuDevice {
    pub instance: Instance,
    pub adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
}

impl GpuDevice {
    /// Create a new GPU device for offscreen rendering
    pub async fn new() -> Result<Self> {
        Self::request(Instance::default(), None).await
    }

    /// Create a GPU device able to present to `surface`
    ///
    /// The surface must have been created from `instance`.
    pub async fn request(instance: Instance, surface: Option<&Surface<'_>>) -> Result<Self> {
        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("Failed to find an appropriate adapter"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: Some("portal_device"),
                },
                None,
            )
            .await
            .context("Failed to create device")?;

        let gpu = Self {
            instance,
            adapter,
            device,
            queue,
        };
        log::info!("{}", gpu.info());
        Ok(gpu)
    }

    /// Get device info for logging
    pub fn info(&self) -> String {
        let info = self.adapter.get_info();
        format!(
            "GPU: {} ({:?}), Features: {:?}",
            info.name,
            info.backend,
            self.device.features()
        )
    }

    /// Create a buffer with initial data
    pub fn create_buffer_with_data<T: bytemuck::Pod>(
        &self,
        label: &str,
        usage: wgpu::BufferUsages,
        data: &[T],
    ) -> wgpu::Buffer {
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage,
        })
    }

    /// Create a uniform buffer holding a single parameter block
    pub fn create_uniform_buffer<T: bytemuck::Pod>(&self, label: &str, params: &T) -> wgpu::Buffer {
        self.create_buffer_with_data(
            label,
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            std::slice::from_ref(params),
        )
    }

    /// Run `build` inside a validation error scope and turn a captured error into `Err`
    ///
    /// Shader and pipeline creation report problems asynchronously through the
    /// device; this makes them fatal at the call site instead.
    pub fn validated<T>(&self, what: &str, build: impl FnOnce(&Device) -> T) -> Result<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = build(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(anyhow!("{} failed validation: {}", what, err)),
            None => Ok(value),
        }
    }

    /// Submit commands to the GPU
    pub fn submit(&self, commands: wgpu::CommandBuffer) {
        self.queue.submit(Some(commands));
    }

    /// Wait for GPU operations to complete
    pub fn wait(&self) {
        self.device.poll(wgpu::Maintain::Wait);
    }
}
