use nalgebra::{DMatrix, DVector};
use tracing::{debug, info, instrument};

use crate::hdr_pipeline::common::weight::LDR_LEVELS;
use crate::hdr_pipeline::common::{CalibrationError, WeightFunction};
use crate::hdr_pipeline::image::{ExposureStack, CHANNELS};

use super::sampling::stratified_locations;
use super::types::{CalibrationConfig, CameraResponse};

/// Relative singular value below which the response system counts as rank deficient.
const RANK_TOLERANCE: f64 = 1e-10;

/// Solves for `g(z) = ln(E_i) + ln(Δt_j)` in the weighted least-squares sense,
/// with a smoothness penalty on `g''` and `g(reference_value) = 0`.
pub struct DebevecCalibrator {
    config: CalibrationConfig,
    weights: WeightFunction,
}

impl DebevecCalibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            weights: WeightFunction::hat(),
        }
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    #[instrument(skip_all, fields(images = stack.len(), samples = self.config.samples))]
    pub fn calibrate(&self, stack: &ExposureStack) -> Result<CameraResponse, CalibrationError> {
        if stack.len() < 2 {
            return Err(CalibrationError::TooFewImages(stack.len()));
        }

        let locations = stratified_locations(stack.width(), stack.height(), self.config.samples);
        let log_times: Vec<f64> = stack
            .exposure_times()
            .iter()
            .map(|&t| (t as f64).ln())
            .collect();
        debug!(locations = locations.len(), "Sampled pixel locations");

        let mut curves = [[0.0f32; LDR_LEVELS]; CHANNELS];
        for (channel, curve) in curves.iter_mut().enumerate() {
            let observations: Vec<Vec<u8>> = locations
                .iter()
                .map(|&(x, y)| stack.images().iter().map(|img| img.sample(x, y, channel)).collect())
                .collect();
            *curve = self.solve_channel(channel, &observations, &log_times)?;
        }

        let response = CameraResponse::from_curves(curves)?;
        info!(
            monotonic = (0..CHANNELS).all(|c| response.is_monotonic(c)),
            "Response calibration complete"
        );
        Ok(response)
    }

    /// `observations[i][j]` is the value of sample `i` in exposure `j`.
    fn solve_channel(
        &self,
        channel: usize,
        observations: &[Vec<u8>],
        log_times: &[f64],
    ) -> Result<[f32; LDR_LEVELS], CalibrationError> {
        let w = |z: u8| self.weights.weight(z) as f64;

        // Samples that are clipped in every exposure constrain nothing.
        let usable: Vec<&Vec<u8>> = observations
            .iter()
            .filter(|row| row.iter().any(|&z| w(z) > 0.0))
            .collect();

        let mut seen = [false; LDR_LEVELS];
        for row in &usable {
            for &z in row.iter().filter(|&&z| w(z) > 0.0) {
                seen[z as usize] = true;
            }
        }
        let distinct = seen.iter().filter(|&&s| s).count();
        if distinct < 2 {
            return Err(CalibrationError::InsufficientSamples {
                channel,
                distinct,
                required: 2,
            });
        }

        let n = usable.len();
        let unknowns = LDR_LEVELS + n;
        let data_rows: usize = usable
            .iter()
            .map(|row| row.iter().filter(|&&z| w(z) > 0.0).count())
            .sum();
        let rows = data_rows + 1 + (LDR_LEVELS - 2);

        let mut a = DMatrix::<f64>::zeros(rows, unknowns);
        let mut b = DVector::<f64>::zeros(rows);
        let mut k = 0;

        for (i, row) in usable.iter().enumerate() {
            for (j, &z) in row.iter().enumerate() {
                let wij = w(z);
                if wij <= 0.0 {
                    continue;
                }
                a[(k, z as usize)] = wij;
                a[(k, LDR_LEVELS + i)] = -wij;
                b[k] = wij * log_times[j];
                k += 1;
            }
        }

        a[(k, self.config.reference_value as usize)] = 1.0;
        k += 1;

        let lambda = self.config.lambda as f64;
        for z in 1..LDR_LEVELS - 1 {
            let s = lambda * w(z as u8);
            a[(k, z - 1)] = s;
            a[(k, z)] = -2.0 * s;
            a[(k, z + 1)] = s;
            k += 1;
        }
        debug_assert_eq!(k, rows);

        let svd = a.svd(true, true);
        let max_singular = svd.singular_values.max();
        let eps = max_singular * RANK_TOLERANCE;
        let rank = svd.rank(eps);
        debug!(channel, rows, unknowns, rank, "Response system assembled");
        if max_singular <= 0.0 || rank < unknowns {
            return Err(CalibrationError::Singular { channel, rank, unknowns });
        }

        let x = svd
            .solve(&b, eps)
            .map_err(|_| CalibrationError::Singular { channel, rank, unknowns })?;

        let mut curve = [0.0f32; LDR_LEVELS];
        for (z, g) in curve.iter_mut().enumerate() {
            *g = x[z] as f32;
        }
        if curve.iter().any(|g| !g.is_finite()) {
            return Err(CalibrationError::NonFinite { channel });
        }
        Ok(curve)
    }
}
