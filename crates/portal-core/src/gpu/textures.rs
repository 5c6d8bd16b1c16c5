use anyhow::{ensure, Result};
use half::f16;
use wgpu::{Device, Queue, Texture, TextureViewDescriptor};

use crate::gpu::{GpuDevice, RenderTarget};
use crate::TexturePrecision;

/// Identity of one of the two simulation surfaces, independent of its role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

/// Primary/secondary role bookkeeping for a pair of values
///
/// `swap` only exchanges roles; the values themselves never move.
#[derive(Debug)]
pub struct PingPong<T> {
    slots: [T; 2],
    a_is_primary: bool,
    swaps: u64,
}

impl<T> PingPong<T> {
    /// Slot A starts as primary (write target), slot B as secondary (read source)
    pub fn new(a: T, b: T) -> Self {
        Self {
            slots: [a, b],
            a_is_primary: true,
            swaps: 0,
        }
    }

    pub fn primary_slot(&self) -> Slot {
        if self.a_is_primary {
            Slot::A
        } else {
            Slot::B
        }
    }

    pub fn secondary_slot(&self) -> Slot {
        self.primary_slot().other()
    }

    pub fn primary(&self) -> &T {
        self.get(self.primary_slot())
    }

    pub fn secondary(&self) -> &T {
        self.get(self.secondary_slot())
    }

    pub fn get(&self, slot: Slot) -> &T {
        &self.slots[slot.index()]
    }

    pub fn get_mut(&mut self, slot: Slot) -> &mut T {
        &mut self.slots[slot.index()]
    }

    /// Exchange the primary and secondary roles
    pub fn swap(&mut self) {
        self.a_is_primary = !self.a_is_primary;
        self.swaps += 1;
    }

    /// Number of swaps since construction
    pub fn swaps(&self) -> u64 {
        self.swaps
    }
}

/// Texture format used for simulation state at a given precision
pub fn state_format(precision: TexturePrecision) -> wgpu::TextureFormat {
    match precision {
        TexturePrecision::Full => wgpu::TextureFormat::Rgba32Float,
        TexturePrecision::Half => wgpu::TextureFormat::Rgba16Float,
    }
}

/// Float RGBA texture holding simulation state, one texel per element
pub struct StateTexture {
    pub texture: Texture,
    pub target: RenderTarget,
    pub size: [u32; 2],
    pub precision: TexturePrecision,
}

impl StateTexture {
    /// Create a state texture; `renderable` adds the render attachment usage
    ///
    /// Only one mip level is ever allocated and shaders fetch texels with
    /// `textureLoad`, so sampling is always point sampling.
    pub fn new(device: &Device, label: &str, size: [u32; 2], precision: TexturePrecision, renderable: bool) -> Self {
        let format = state_format(precision);
        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC;
        if renderable {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });

        let view = texture.create_view(&TextureViewDescriptor {
            label: Some(label),
            ..Default::default()
        });

        Self {
            target: RenderTarget::new(label, view, size, format),
            texture,
            size,
            precision,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        self.target.view()
    }

    /// Upload one `[r, g, b, a]` per texel, row-major
    pub fn upload(&self, queue: &Queue, texels: &[[f32; 4]]) -> Result<()> {
        let expected = (self.size[0] * self.size[1]) as usize;
        ensure!(
            texels.len() == expected,
            "Invalid texel count for {}: expected {}, got {}",
            self.target.label(),
            expected,
            texels.len()
        );

        let bytes = encode_texels(texels, self.precision);
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bytes,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.size[0] * self.precision.bytes_per_texel()),
                rows_per_image: Some(self.size[1]),
            },
            extent(self.size),
        );
        Ok(())
    }

    /// Read the whole texture back as `[r, g, b, a]` per texel
    pub fn download(&self, gpu: &GpuDevice) -> Result<Vec<[f32; 4]>> {
        let bytes = read_texture(gpu, &self.texture, self.size, self.precision.bytes_per_texel())?;
        Ok(decode_texels(&bytes, self.precision))
    }
}

/// The two ping-pong simulation surfaces
pub struct RenderTargetPair {
    surfaces: PingPong<StateTexture>,
}

impl RenderTargetPair {
    pub fn new(device: &Device, size: [u32; 2], precision: TexturePrecision) -> Self {
        let a = StateTexture::new(device, "flow_field_a", size, precision, true);
        let b = StateTexture::new(device, "flow_field_b", size, precision, true);
        Self {
            surfaces: PingPong::new(a, b),
        }
    }

    /// Current write target
    pub fn primary(&self) -> &StateTexture {
        self.surfaces.primary()
    }

    /// Current read source, holding the last completed step
    pub fn secondary(&self) -> &StateTexture {
        self.surfaces.secondary()
    }

    pub fn primary_slot(&self) -> Slot {
        self.surfaces.primary_slot()
    }

    pub fn secondary_slot(&self) -> Slot {
        self.surfaces.secondary_slot()
    }

    pub fn get(&self, slot: Slot) -> &StateTexture {
        self.surfaces.get(slot)
    }

    pub fn swap(&mut self) {
        self.surfaces.swap();
    }

    pub fn swaps(&self) -> u64 {
        self.surfaces.swaps()
    }
}

/// Offscreen color target standing in for a window surface
pub struct Canvas {
    pub texture: Texture,
    pub target: RenderTarget,
    pub size: [u32; 2],
}

impl Canvas {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn new(device: &Device, size: [u32; 2]) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("canvas"),
            size: extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&TextureViewDescriptor::default());

        Self {
            target: RenderTarget::new("canvas", view, size, Self::FORMAT),
            texture,
            size,
        }
    }

    /// Read the canvas back as tightly packed RGBA8 rows
    pub fn download(&self, gpu: &GpuDevice) -> Result<Vec<u8>> {
        read_texture(gpu, &self.texture, self.size, 4)
    }
}

fn extent(size: [u32; 2]) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size[0],
        height: size[1],
        depth_or_array_layers: 1,
    }
}

/// Copy a texture into a mappable buffer and return its rows without padding
pub fn read_texture(gpu: &GpuDevice, texture: &Texture, size: [u32; 2], bytes_per_texel: u32) -> Result<Vec<u8>> {
    let unpadded_bpr = size[0] * bytes_per_texel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded_bpr = unpadded_bpr.div_ceil(align) * align;

    let staging_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("texture_download_staging"),
        size: (padded_bpr * size[1]) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("texture_download_encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging_buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr),
                rows_per_image: Some(size[1]),
            },
        },
        extent(size),
    );
    gpu.submit(encoder.finish());

    let slice = staging_buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    gpu.wait();
    rx.recv()??;

    let data = slice.get_mapped_range();
    let mut bytes = Vec::with_capacity((unpadded_bpr * size[1]) as usize);
    for row in data.chunks_exact(padded_bpr as usize) {
        bytes.extend_from_slice(&row[..unpadded_bpr as usize]);
    }
    drop(data);
    staging_buffer.unmap();

    Ok(bytes)
}

/// Pack texels into the byte layout of the given precision
pub fn encode_texels(texels: &[[f32; 4]], precision: TexturePrecision) -> Vec<u8> {
    match precision {
        TexturePrecision::Full => bytemuck::cast_slice(texels).to_vec(),
        TexturePrecision::Half => texels
            .iter()
            .flatten()
            .flat_map(|v| f16::from_f32(*v).to_le_bytes())
            .collect(),
    }
}

/// Unpack texels from the byte layout of the given precision
pub fn decode_texels(bytes: &[u8], precision: TexturePrecision) -> Vec<[f32; 4]> {
    match precision {
        TexturePrecision::Full => bytes
            .chunks_exact(16)
            .map(|chunk| {
                let mut texel = [0.0f32; 4];
                for (i, channel) in chunk.chunks_exact(4).enumerate() {
                    texel[i] = f32::from_le_bytes([channel[0], channel[1], channel[2], channel[3]]);
                }
                texel
            })
            .collect(),
        TexturePrecision::Half => bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut texel = [0.0f32; 4];
                for (i, channel) in chunk.chunks_exact(2).enumerate() {
                    texel[i] = f16::from_le_bytes([channel[0], channel[1]]).to_f32();
                }
                texel
            })
            .collect(),
    }
}
