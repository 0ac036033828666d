use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::hdr_pipeline::calibrate::CameraResponse;
use crate::hdr_pipeline::common::WeightFunction;
use crate::hdr_pipeline::image::{ExposureStack, RadianceMap, CHANNELS};

/// Weighted log-domain average of the per-exposure radiance estimates.
#[derive(Debug, Clone)]
pub struct DebevecMerger {
    weights: WeightFunction,
}

impl Default for DebevecMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl DebevecMerger {
    pub fn new() -> Self {
        Self {
            weights: WeightFunction::hat(),
        }
    }

    /// `E = exp(Σ w(Z_j) (g(Z_j) - ln Δt_j) / Σ w(Z_j))` per pixel and
    /// channel. Where every exposure has zero weight the middle exposure's
    /// estimate is used on its own.
    #[instrument(skip_all, fields(images = stack.len(), width = stack.width(), height = stack.height()))]
    pub fn merge(&self, stack: &ExposureStack, response: &CameraResponse) -> RadianceMap {
        let (width, height) = (stack.width(), stack.height());
        let images = stack.images();
        let log_times: Vec<f32> = stack.exposure_times().iter().map(|t| t.ln()).collect();
        let middle = stack.middle_index();
        let row_len = width * CHANNELS;

        let mut data = vec![0.0f32; row_len * height];
        let fallbacks: usize = data
            .par_chunks_mut(row_len)
            .enumerate()
            .map(|(y, row)| {
                let offset = y * row_len;
                let mut fallbacks = 0;
                for (i, out) in row.iter_mut().enumerate() {
                    let channel = i % CHANNELS;
                    let mut weighted = 0.0f32;
                    let mut total = 0.0f32;
                    for (image, &log_t) in images.iter().zip(&log_times) {
                        let z = image.data[offset + i];
                        let w = self.weights.weight(z);
                        weighted += w * (response.log_exposure(channel, z) - log_t);
                        total += w;
                    }
                    let log_e = if total > 0.0 {
                        weighted / total
                    } else {
                        fallbacks += 1;
                        let z = images[middle].data[offset + i];
                        response.log_exposure(channel, z) - log_times[middle]
                    };
                    *out = log_e.exp();
                }
                fallbacks
            })
            .sum();

        debug!(fallbacks, "Radiance merge complete");
        RadianceMap::new(width, height, data)
    }
}
