//! Pixel reliability weighting.
//!
//! Calibration and merging must see the same weights, otherwise the recovered
//! response curve is not consistent with the radiance estimate built from it.

/// Number of representable 8-bit pixel values.
pub const LDR_LEVELS: usize = 256;

/// Hat-shaped weight over the 8-bit domain: zero at 0 and 255, peak of 1.0
/// at 127 and 128.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightFunction {
    table: [f32; LDR_LEVELS],
}

impl WeightFunction {
    pub fn hat() -> Self {
        let mut table = [0.0f32; LDR_LEVELS];
        for (z, w) in table.iter_mut().enumerate() {
            let distance = if z <= 127 { z } else { 255 - z };
            *w = distance as f32 / 127.0;
        }
        Self { table }
    }

    #[inline]
    pub fn weight(&self, z: u8) -> f32 {
        self.table[z as usize]
    }

    pub fn table(&self) -> &[f32; LDR_LEVELS] {
        &self.table
    }
}

impl Default for WeightFunction {
    fn default() -> Self {
        Self::hat()
    }
}
