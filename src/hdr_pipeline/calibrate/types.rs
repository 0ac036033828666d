//! Response calibration types

use crate::hdr_pipeline::common::weight::LDR_LEVELS;
use crate::hdr_pipeline::common::CalibrationError;
use crate::hdr_pipeline::image::CHANNELS;

/// Configuration for Debevec response recovery
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationConfig {
    /// Number of pixel locations sampled on a regular grid
    pub samples: usize,
    /// Weight of the second-derivative smoothness term
    pub lambda: f32,
    /// Pixel value pinned to zero log-response
    pub reference_value: u8,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            samples: 200,
            lambda: 10.0,
            reference_value: 128,
        }
    }
}

/// Camera response function: for each RGB channel, the log exposure
/// `ln(E * Δt)` that produced each 8-bit pixel value.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraResponse {
    curves: [[f32; LDR_LEVELS]; CHANNELS],
}

impl CameraResponse {
    pub fn from_curves(curves: [[f32; LDR_LEVELS]; CHANNELS]) -> Result<Self, CalibrationError> {
        for (channel, curve) in curves.iter().enumerate() {
            if curve.iter().any(|v| !v.is_finite()) {
                return Err(CalibrationError::NonFinite { channel });
            }
        }
        Ok(Self { curves })
    }

    pub fn curve(&self, channel: usize) -> &[f32; LDR_LEVELS] {
        &self.curves[channel]
    }

    #[inline]
    pub fn log_exposure(&self, channel: usize, z: u8) -> f32 {
        self.curves[channel][z as usize]
    }

    /// Whether the curve never decreases. Physical responses do; recovered
    /// curves may wiggle in the unobserved tails.
    pub fn is_monotonic(&self, channel: usize) -> bool {
        self.curves[channel].windows(2).all(|w| w[1] >= w[0])
    }
}
