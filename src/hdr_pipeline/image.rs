//! Pixel containers shared by every stage.
//!
//! 8-bit exposures come in through [`ExposureStack`], the merged result lives in
//! [`RadianceMap`] and each tonemap operator hands back a [`ToneMappedImage`].
//! All RGB buffers are interleaved `[R, G, B, R, G, B, ...]`, row-major.

mod types;
mod radiance;
pub(crate) mod plane;

#[cfg(test)]
pub(crate) mod synthetic;


pub use types::{ExposureImage, ExposureStack, RgbImageData, CHANNELS};
pub use radiance::{RadianceMap, ToneMappedImage};

/// Rec.601 luma weights, applied to RGB samples.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

#[inline]
pub fn luminance(rgb: [f32; 3]) -> f32 {
    LUMA_WEIGHTS[0] * rgb[0] + LUMA_WEIGHTS[1] * rgb[1] + LUMA_WEIGHTS[2] * rgb[2]
}
