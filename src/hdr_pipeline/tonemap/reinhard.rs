use tracing::{debug, instrument};

use crate::hdr_pipeline::common::ToneMapError;
use crate::hdr_pipeline::image::plane::Plane;
use crate::hdr_pipeline::image::{RadianceMap, ToneMappedImage, CHANNELS};

use super::luminance::{channel_plane, check_param, log_floor, normalize_linear};
use super::types::{ToneMapKind, ToneMapper};

/// Radius of the neighborhood used for local adaptation (3x3 window).
const LOCAL_RADIUS: usize = 1;

/// Photographic mapping (Reinhard & Devlin, 2005).
///
/// Every channel is compressed as `c / (c + a^m)` where the adaptation level
/// `a` blends a global scene average with the local 3x3 neighborhood, and
/// `m` follows the image key.
#[derive(Debug, Clone, PartialEq)]
pub struct Reinhard {
    pub gamma: f32,
    /// In [-8, 8]. Higher is brighter.
    pub intensity: f32,
    /// 0 adapts to the local neighborhood only, 1 to the global average only.
    pub light_adapt: f32,
    /// 0 adapts to luminance only, 1 to each channel independently.
    pub color_adapt: f32,
}

impl Default for Reinhard {
    fn default() -> Self {
        Self {
            gamma: 1.5,
            intensity: 0.0,
            light_adapt: 0.0,
            color_adapt: 0.0,
        }
    }
}

impl ToneMapper for Reinhard {
    fn kind(&self) -> ToneMapKind {
        ToneMapKind::Reinhard
    }

    fn validate(&self) -> Result<(), ToneMapError> {
        let kind = self.kind();
        check_param(kind, "gamma", self.gamma, self.gamma > 0.0, "must be positive")?;
        check_param(
            kind,
            "intensity",
            self.intensity,
            (-8.0..=8.0).contains(&self.intensity),
            "must be in [-8, 8]",
        )?;
        check_param(
            kind,
            "light_adapt",
            self.light_adapt,
            (0.0..=1.0).contains(&self.light_adapt),
            "must be in [0, 1]",
        )?;
        check_param(
            kind,
            "color_adapt",
            self.color_adapt,
            (0.0..=1.0).contains(&self.color_adapt),
            "must be in [0, 1]",
        )
    }

    #[instrument(skip_all, fields(operator = "Reinhard"))]
    fn tonemap(&self, radiance: &RadianceMap) -> Result<ToneMappedImage, ToneMapError> {
        self.validate()?;
        let kind = self.kind();
        let (w, h) = (radiance.width(), radiance.height());

        let mut img = radiance.data().to_vec();
        normalize_linear(kind, &mut img, 1.0, "input")?;

        let gray = Plane::luminance_of(w, h, &img);
        let log_gray = gray.map(log_floor);
        let log_mean = log_gray.mean() as f32;
        let (log_min, log_max) = log_gray.min_max();
        let key = if log_max - log_min > f32::EPSILON {
            (log_max - log_mean) / (log_max - log_min)
        } else {
            0.5
        };
        let map_key = 0.3 + 0.7 * key.powf(1.4);
        let intensity = (-self.intensity).exp();
        let gray_mean = gray.mean() as f32;
        debug!(key, map_key, gray_mean, "Reinhard image key");

        let (ca, la) = (self.color_adapt, self.light_adapt);
        for channel in 0..CHANNELS {
            let chan = channel_plane(&img, w, h, channel);
            let global = ca * chan.mean() as f32 + (1.0 - ca) * gray_mean;

            let mut blended = chan.clone();
            for (b, &g) in blended.data.iter_mut().zip(&gray.data) {
                *b = ca * *b + (1.0 - ca) * g;
            }
            let local = blended.box_mean(LOCAL_RADIUS);

            for (i, (&c, &l)) in chan.data.iter().zip(&local.data).enumerate() {
                let adapt = (intensity * (la * global + (1.0 - la) * l)).max(0.0).powf(map_key);
                let denom = c + adapt;
                img[i * CHANNELS + channel] = if denom > 0.0 { c / denom } else { 0.0 };
            }
        }

        normalize_linear(kind, &mut img, self.gamma, "output")?;
        Ok(ToneMappedImage::new(w, h, img))
    }
}
