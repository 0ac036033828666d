use tracing::{debug, instrument};

use crate::hdr_pipeline::common::ToneMapError;
use crate::hdr_pipeline::image::plane::Plane;
use crate::hdr_pipeline::image::{RadianceMap, ToneMappedImage};

use super::luminance::{check_param, log_floor, map_luminance, normalize_linear};
use super::types::{ToneMapKind, ToneMapper};

/// Adaptive logarithmic mapping (Drago et al., 2003).
///
/// Each pixel's luminance is compressed with a logarithm whose base moves
/// from 2 in the shadows towards 10 at the brightest pixel; `bias` controls
/// how quickly the base changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Drago {
    pub gamma: f32,
    pub saturation: f32,
    /// In (0, 1]. Lower values compress highlights harder.
    pub bias: f32,
}

impl Default for Drago {
    fn default() -> Self {
        Self {
            gamma: 0.6,
            saturation: 0.4,
            bias: 0.9,
        }
    }
}

impl ToneMapper for Drago {
    fn kind(&self) -> ToneMapKind {
        ToneMapKind::Drago
    }

    fn validate(&self) -> Result<(), ToneMapError> {
        let kind = self.kind();
        check_param(kind, "gamma", self.gamma, self.gamma > 0.0, "must be positive")?;
        check_param(kind, "saturation", self.saturation, self.saturation >= 0.0, "must not be negative")?;
        check_param(kind, "bias", self.bias, self.bias > 0.0 && self.bias <= 1.0, "must be in (0, 1]")
    }

    #[instrument(skip_all, fields(operator = "Drago"))]
    fn tonemap(&self, radiance: &RadianceMap) -> Result<ToneMappedImage, ToneMapError> {
        self.validate()?;
        let kind = self.kind();
        let (w, h) = (radiance.width(), radiance.height());

        let mut img = radiance.data().to_vec();
        normalize_linear(kind, &mut img, 1.0, "input")?;

        let gray = Plane::luminance_of(w, h, &img);
        let log_average = gray.map(log_floor).mean().exp() as f32;
        let gray = gray.map(|v| v / log_average);
        let (_, max) = gray.min_max();
        if !(max > 0.0) {
            debug!("Black input, returning zeros");
            return Ok(ToneMappedImage::new(w, h, vec![0.0; img.len()]));
        }

        let exponent = self.bias.ln() / 0.5f32.ln();
        let mapped = gray.map(|g| (g + 1.0).ln() / (2.0 + 8.0 * (g / max).powf(exponent)).ln());
        debug!(log_average, max, exponent, "Drago luminance mapped");

        map_luminance(&mut img, &gray, &mapped, self.saturation);
        normalize_linear(kind, &mut img, self.gamma, "output")?;
        Ok(ToneMappedImage::new(w, h, img))
    }
}
