/// Per-channel statistics over the live elements of a state texture
#[derive(Debug, Clone, PartialEq)]
pub struct StateStats {
    pub count: u32,
    pub mean: [f32; 4],
    pub min: [f32; 4],
    pub max: [f32; 4],
}

impl Default for StateStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: [0.0; 4],
            min: [0.0; 4],
            max: [0.0; 4],
        }
    }
}

impl StateStats {
    /// Calculate statistics over the first `count` texels
    ///
    /// Texels past `count` are grid padding and are skipped.
    pub fn from_texels(texels: &[[f32; 4]], count: u32) -> Self {
        let live = &texels[..texels.len().min(count as usize)];
        if live.is_empty() {
            return Self::default();
        }

        let mut sum = [0.0f64; 4];
        let mut min = [f32::INFINITY; 4];
        let mut max = [f32::NEG_INFINITY; 4];

        for texel in live {
            for c in 0..4 {
                sum[c] += texel[c] as f64;
                min[c] = min[c].min(texel[c]);
                max[c] = max[c].max(texel[c]);
            }
        }

        let n = live.len() as f64;
        Self {
            count: live.len() as u32,
            mean: sum.map(|s| (s / n) as f32),
            min,
            max,
        }
    }
}
