use std::path::{Path, PathBuf};

use anyhow::{ensure, Result};
use image::{ImageBuffer, Rgb, RgbImage, RgbaImage};
use portal_core::GridLayout;

/// Writes flow-field state and canvas images
pub struct SnapshotWriter {
    output_dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(output_dir: &Path) -> Result<Self> {
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Write the state as `state_NNNN.png`, one pixel per texel
    pub fn write_state_snapshot(&self, frame: u32, layout: &GridLayout, texels: &[[f32; 4]]) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("state_{:04}.png", frame));
        state_image(layout, texels)?.save(&path)?;
        Ok(path)
    }

    /// Write the rendered canvas as `frame_NNNN.png`
    pub fn write_canvas_snapshot(&self, frame: u32, size: [u32; 2], rgba: &[u8]) -> Result<PathBuf> {
        let path = self.output_dir.join(format!("frame_{:04}.png", frame));
        let img: RgbaImage = ImageBuffer::from_raw(size[0], size[1], rgba.to_vec())
            .ok_or_else(|| anyhow::anyhow!("Canvas data does not match {}x{}", size[0], size[1]))?;
        img.save(&path)?;
        Ok(path)
    }
}

/// Map the RGB channels of the first `count` texels to pixels
///
/// Each channel is normalised over the live elements separately; padding
/// texels are left black.
pub fn state_image(layout: &GridLayout, texels: &[[f32; 4]]) -> Result<RgbImage> {
    ensure!(
        texels.len() >= layout.count as usize,
        "Expected at least {} texels, got {}",
        layout.count,
        texels.len()
    );

    let live = &texels[..layout.count as usize];
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for texel in live {
        for c in 0..3 {
            if texel[c].is_finite() {
                min[c] = min[c].min(texel[c]);
                max[c] = max[c].max(texel[c]);
            }
        }
    }

    let mut img: RgbImage = ImageBuffer::new(layout.width, layout.height);
    for (i, texel) in live.iter().enumerate() {
        let (x, y) = layout.texel(i as u32);
        let mut pixel = [0u8; 3];
        for c in 0..3 {
            let range = max[c] - min[c];
            let range = if range > 0.0 { range } else { 1.0 };
            let value = if texel[c].is_finite() { (texel[c] - min[c]) / range } else { 0.0 };
            pixel[c] = (value.clamp(0.0, 1.0) * 255.0) as u8;
        }
        img.put_pixel(x, y, Rgb(pixel));
    }

    Ok(img)
}
