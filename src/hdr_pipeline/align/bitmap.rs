use rayon::prelude::*;

use super::types::Offset;

/// Levels whose shorter side would drop below this are not built.
const MIN_LEVEL_DIMENSION: usize = 8;

/// Offsets that leave less than this share of the image overlapping are not scored.
const MIN_OVERLAP_FRACTION: f64 = 0.5;

/// 8-bit grayscale level of an alignment pyramid.
#[derive(Debug, Clone)]
pub(super) struct GrayLevel {
    pub w: usize,
    pub h: usize,
    pub data: Vec<u8>,
}

impl GrayLevel {
    /// 2x reduction by 2x2 block averaging; odd trailing rows/columns are dropped.
    fn half(&self) -> Self {
        let (nw, nh) = (self.w / 2, self.h / 2);
        let mut data = vec![0u8; nw * nh];
        for y in 0..nh {
            let r0 = &self.data[(2 * y) * self.w..(2 * y + 1) * self.w];
            let r1 = &self.data[(2 * y + 1) * self.w..(2 * y + 2) * self.w];
            for x in 0..nw {
                let sum = r0[2 * x] as u32 + r0[2 * x + 1] as u32 + r1[2 * x] as u32 + r1[2 * x + 1] as u32;
                data[y * nw + x] = ((sum + 2) / 4) as u8;
            }
        }
        Self { w: nw, h: nh, data }
    }

    fn median(&self) -> u8 {
        let mut histogram = [0usize; 256];
        for &v in &self.data {
            histogram[v as usize] += 1;
        }
        let half = self.data.len().div_ceil(2);
        let mut seen = 0;
        for (value, &count) in histogram.iter().enumerate() {
            seen += count;
            if seen >= half {
                return value as u8;
            }
        }
        255
    }
}

/// Full resolution first, coarsest last.
pub(super) fn gray_pyramid(
    gray: Vec<u8>,
    w: usize,
    h: usize,
    max_coarse_dimension: usize,
    max_levels: usize,
) -> Vec<GrayLevel> {
    let mut levels = vec![GrayLevel { w, h, data: gray }];
    while levels.len() < max_levels.max(1) {
        let last = &levels[levels.len() - 1];
        if last.w.max(last.h) <= max_coarse_dimension || last.w.min(last.h) / 2 < MIN_LEVEL_DIMENSION {
            break;
        }
        let next = last.half();
        levels.push(next);
    }
    levels
}

/// Median threshold bitmap plus the mask of pixels far enough from the median
/// to be trusted.
#[derive(Debug, Clone)]
pub(super) struct MtbBitmap {
    pub w: usize,
    pub h: usize,
    threshold: Vec<bool>,
    valid: Vec<bool>,
}

impl MtbBitmap {
    pub fn from_gray(level: &GrayLevel, exclusion_range: u8) -> Self {
        let median = level.median() as i16;
        let range = exclusion_range as i16;
        let threshold = level.data.iter().map(|&v| v as i16 > median).collect();
        let valid = level
            .data
            .iter()
            .map(|&v| (v as i16 - median).abs() > range)
            .collect();
        Self {
            w: level.w,
            h: level.h,
            threshold,
            valid,
        }
    }

    /// Differing trusted bits between `self` (the moving image) and
    /// `reference`, assuming `self(x, y) = reference(x - dx, y - dy)`.
    /// Pixels that map outside the reference are ignored. `None` when the
    /// overlap is too small for the count to mean anything.
    pub fn count_errors(&self, reference: &MtbBitmap, offset: Offset) -> Option<BitErrors> {
        let (w, h) = (self.w as i64, self.h as i64);
        let (dx, dy) = (offset.dx as i64, offset.dy as i64);
        let (x_lo, x_hi) = (dx.max(0), (w + dx).min(w));
        let (y_lo, y_hi) = (dy.max(0), (h + dy).min(h));
        if x_lo >= x_hi || y_lo >= y_hi {
            return None;
        }
        let overlap = ((x_hi - x_lo) * (y_hi - y_lo)) as u64;
        if (overlap as f64) < MIN_OVERLAP_FRACTION * (w * h) as f64 {
            return None;
        }

        let errors = (y_lo..y_hi)
            .into_par_iter()
            .map(|y| {
                let row = (y * w) as usize;
                let ref_row = ((y - dy) * w) as usize;
                let mut errors = 0u64;
                for x in x_lo..x_hi {
                    let i = row + x as usize;
                    let j = ref_row + (x - dx) as usize;
                    if self.valid[i] && reference.valid[j] && self.threshold[i] != reference.threshold[j] {
                        errors += 1;
                    }
                }
                errors
            })
            .sum();
        Some(BitErrors { errors, overlap })
    }
}

/// Bit error count over an overlap of `overlap` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct BitErrors {
    pub errors: u64,
    pub overlap: u64,
}

impl BitErrors {
    /// Strictly lower error rate than `other`.
    pub fn beats(&self, other: &BitErrors) -> bool {
        (self.errors as u128) * (other.overlap as u128) < (other.errors as u128) * (self.overlap as u128)
    }
}
