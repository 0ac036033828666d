//! Owned single-channel f32 grid in row-major layout.
//!
//! Working buffer for luminance, log-luminance and contrast fields inside the
//! tonemap operators.

use rayon::prelude::*;

use super::luminance;
use super::types::CHANNELS;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Plane {
    pub w: usize,
    pub h: usize,
    pub data: Vec<f32>,
}

impl Plane {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0.0; w * h],
        }
    }

    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), w * h);
        Self { w, h, data }
    }

    /// Rec.601 luminance of an interleaved RGB buffer.
    pub fn luminance_of(w: usize, h: usize, rgb: &[f32]) -> Self {
        let data = rgb
            .chunks_exact(CHANNELS)
            .map(|px| luminance([px[0], px[1], px[2]]))
            .collect();
        Self::from_vec(w, h, data)
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }

    pub fn map(&self, f: impl Fn(f32) -> f32 + Sync) -> Self {
        Self::from_vec(self.w, self.h, self.data.par_iter().map(|&v| f(v)).collect())
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }

    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            0.0
        } else {
            self.sum() / self.data.len() as f64
        }
    }

    pub fn min_max(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    pub fn dot(&self, other: &Plane) -> f64 {
        self.data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| a as f64 * b as f64)
            .sum()
    }

    /// `self += alpha * other`
    pub fn add_scaled(&mut self, alpha: f32, other: &Plane) {
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a += alpha * b;
        }
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    /// Bilinear resampling with pixel-center alignment; a 2x reduction averages
    /// each 2x2 block.
    pub fn resized(&self, nw: usize, nh: usize) -> Self {
        if nw == self.w && nh == self.h {
            return self.clone();
        }
        let sx = self.w as f32 / nw as f32;
        let sy = self.h as f32 / nh as f32;
        let cols: Vec<(usize, usize, f32)> = (0..nw).map(|x| sample_coord(x, sx, self.w)).collect();

        let mut out = Plane::new(nw, nh);
        out.data
            .par_chunks_mut(nw)
            .enumerate()
            .for_each(|(y, row)| {
                let (y0, y1, ty) = sample_coord(y, sy, self.h);
                let r0 = &self.data[y0 * self.w..(y0 + 1) * self.w];
                let r1 = &self.data[y1 * self.w..(y1 + 1) * self.w];
                for (x, out) in row.iter_mut().enumerate() {
                    let (x0, x1, tx) = cols[x];
                    let top = r0[x0] + (r0[x1] - r0[x0]) * tx;
                    let bottom = r1[x0] + (r1[x1] - r1[x0]) * tx;
                    *out = top + (bottom - top) * ty;
                }
            });
        out
    }

    /// Mean over the `(2r+1)^2` window, shrunk at the borders.
    pub fn box_mean(&self, radius: usize) -> Self {
        if radius == 0 {
            return self.clone();
        }
        let (w, h) = (self.w, self.h);

        let mut horiz = Plane::new(w, h);
        horiz
            .data
            .par_chunks_mut(w)
            .enumerate()
            .for_each(|(y, row)| {
                let src = &self.data[y * w..(y + 1) * w];
                for (x, out) in row.iter_mut().enumerate() {
                    let lo = x.saturating_sub(radius);
                    let hi = (x + radius).min(w - 1);
                    let sum: f32 = src[lo..=hi].iter().sum();
                    *out = sum / (hi - lo + 1) as f32;
                }
            });

        let mut out = Plane::new(w, h);
        out.data
            .par_chunks_mut(w)
            .enumerate()
            .for_each(|(y, row)| {
                let lo = y.saturating_sub(radius);
                let hi = (y + radius).min(h - 1);
                let n = (hi - lo + 1) as f32;
                for (x, out) in row.iter_mut().enumerate() {
                    let mut sum = 0.0f32;
                    for yy in lo..=hi {
                        sum += horiz.data[yy * w + x];
                    }
                    *out = sum / n;
                }
            });
        out
    }

    /// `d(x, y) = p(x + 1, y) - p(x, y)`, zero in the last column.
    pub fn forward_diff_x(&self) -> Self {
        let mut out = Plane::new(self.w, self.h);
        for y in 0..self.h {
            for x in 0..self.w.saturating_sub(1) {
                out.data[y * self.w + x] = self.get(x + 1, y) - self.get(x, y);
            }
        }
        out
    }

    /// `d(x, y) = p(x, y + 1) - p(x, y)`, zero in the last row.
    pub fn forward_diff_y(&self) -> Self {
        let mut out = Plane::new(self.w, self.h);
        for y in 0..self.h.saturating_sub(1) {
            for x in 0..self.w {
                out.data[y * self.w + x] = self.get(x, y + 1) - self.get(x, y);
            }
        }
        out
    }

    /// `d(x, y) = p(x, y) - p(x - 1, y)`, with `d(0, y) = p(0, y)`.
    pub fn backward_diff_x(&self) -> Self {
        let mut out = self.clone();
        for y in 0..self.h {
            for x in 1..self.w {
                out.data[y * self.w + x] = self.get(x, y) - self.get(x - 1, y);
            }
        }
        out
    }

    /// `d(x, y) = p(x, y) - p(x, y - 1)`, with `d(x, 0) = p(x, 0)`.
    pub fn backward_diff_y(&self) -> Self {
        let mut out = self.clone();
        for y in 1..self.h {
            for x in 0..self.w {
                out.data[y * self.w + x] = self.get(x, y) - self.get(x, y - 1);
            }
        }
        out
    }
}

/// Source index pair and blend factor for output coordinate `d`.
#[inline]
fn sample_coord(d: usize, scale: f32, src_len: usize) -> (usize, usize, f32) {
    let f = ((d as f32 + 0.5) * scale - 0.5).max(0.0);
    let i0 = (f.floor() as usize).min(src_len - 1);
    let i1 = (i0 + 1).min(src_len - 1);
    let t = if i0 == i1 { 0.0 } else { f - i0 as f32 };
    (i0, i1, t)
}
