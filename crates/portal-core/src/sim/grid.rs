use anyhow::{ensure, Result};

use crate::{FLOW_FIELD_WIDTH, MAX_FLOW_FIELD_ROWS};

/// Row-major placement of `count` elements in a fixed-width texture
///
/// Texel `i` sits at column `i % width`, row `i / width`. When `count` is not
/// a multiple of the width the last row has padding texels; their contents
/// are undefined and nothing reads them.
///
/// The height never exceeds `MAX_FLOW_FIELD_ROWS`, so `width * height`
/// always fits in a `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub count: u32,
    pub width: u32,
    pub height: u32,
}

impl GridLayout {
    pub fn new(count: u32) -> Result<Self> {
        ensure!(count > 0, "Flow field needs at least one element");

        let width = FLOW_FIELD_WIDTH;
        let height = count.div_ceil(width);
        ensure!(
            height <= MAX_FLOW_FIELD_ROWS,
            "Flow field of {} elements needs {} rows, at most {} are supported",
            count,
            height,
            MAX_FLOW_FIELD_ROWS
        );
        Ok(Self { count, width, height })
    }

    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    /// Total texels including padding
    pub fn texel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Padding texels at the end of the last row
    pub fn padding(&self) -> u32 {
        self.texel_count() - self.count
    }

    /// Height over width, the aspect of a quad showing the whole grid
    pub fn aspect(&self) -> f32 {
        self.height as f32 / self.width as f32
    }

    /// Column and row of element `index`
    pub fn texel(&self, index: u32) -> (u32, u32) {
        (index % self.width, index / self.width)
    }

    /// Texel-centre coordinates of element `index`
    pub fn uv(&self, index: u32) -> [f32; 2] {
        let half_extent_x = 1.0 / self.width as f32 / 2.0;
        let half_extent_y = 1.0 / self.height as f32 / 2.0;
        let (x, y) = self.texel(index);

        [
            x as f32 / self.width as f32 + half_extent_x,
            y as f32 / self.height as f32 + half_extent_y,
        ]
    }

    /// UV lookup table, one pair per element
    pub fn uv_table(&self) -> Vec<[f32; 2]> {
        (0..self.count).map(|i| self.uv(i)).collect()
    }
}
