//! Helpers shared by the operators: range normalization, luminance
//! remapping and parameter checks.

use crate::hdr_pipeline::common::ToneMapError;
use crate::hdr_pipeline::image::plane::Plane;
use crate::hdr_pipeline::image::CHANNELS;

use super::types::ToneMapKind;

/// Floor applied before taking logarithms of luminance.
pub(super) const LOG_FLOOR: f32 = 1e-4;

#[inline]
pub(super) fn log_floor(v: f32) -> f32 {
    v.max(LOG_FLOOR).ln()
}

pub(super) fn ensure_finite(operator: ToneMapKind, data: &[f32], stage: &'static str) -> Result<(), ToneMapError> {
    if data.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ToneMapError::NonFinite { operator, stage })
    }
}

/// Maps `[min, max]` onto `[0, 1]`, then applies `v^(1/gamma)`.
///
/// A flat buffer is divided by its maximum instead (or zeroed when the
/// maximum is not positive).
pub(super) fn normalize_linear(
    operator: ToneMapKind,
    data: &mut [f32],
    gamma: f32,
    stage: &'static str,
) -> Result<(), ToneMapError> {
    ensure_finite(operator, data, stage)?;
    if data.is_empty() {
        return Ok(());
    }

    let (min, max) = data
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;
    if range > f32::EPSILON * max.abs().max(1.0) {
        data.iter_mut().for_each(|v| *v = (*v - min) / range);
    } else if max > 0.0 {
        data.iter_mut().for_each(|v| *v = (*v / max).clamp(0.0, 1.0));
    } else {
        data.iter_mut().for_each(|v| *v = 0.0);
    }

    if gamma != 1.0 {
        let inv = 1.0 / gamma;
        data.iter_mut().for_each(|v| *v = v.powf(inv));
    }
    ensure_finite(operator, data, stage)
}

/// Replaces the luminance of an RGB buffer: `c' = (c / old)^saturation * new`.
pub(super) fn map_luminance(rgb: &mut [f32], old_lum: &Plane, new_lum: &Plane, saturation: f32) {
    for ((px, &old), &new) in rgb.chunks_exact_mut(CHANNELS).zip(&old_lum.data).zip(&new_lum.data) {
        let old = old.max(LOG_FLOOR);
        for c in px.iter_mut() {
            *c = (c.max(0.0) / old).powf(saturation) * new;
        }
    }
}

/// One channel of an interleaved RGB buffer.
pub(super) fn channel_plane(rgb: &[f32], w: usize, h: usize, channel: usize) -> Plane {
    Plane::from_vec(w, h, rgb.iter().skip(channel).step_by(CHANNELS).copied().collect())
}

pub(super) fn check_param(
    operator: ToneMapKind,
    name: &'static str,
    value: f32,
    valid: bool,
    reason: &'static str,
) -> Result<(), ToneMapError> {
    if valid && value.is_finite() {
        Ok(())
    } else {
        Err(ToneMapError::InvalidParameter {
            operator,
            name,
            value,
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn normalizes_range_then_gamma() {
        let mut data = vec![1.0, 3.0, 5.0];
        normalize_linear(ToneMapKind::Drago, &mut data, 2.0, "output").unwrap();
        assert_abs_diff_eq!(data[0], 0.0);
        assert_abs_diff_eq!(data[1], 0.5f32.sqrt(), epsilon = 1e-6);
        assert_abs_diff_eq!(data[2], 1.0);
    }

    #[test]
    fn flat_buffer_normalizes_to_one() {
        let mut data = vec![4.0; 6];
        normalize_linear(ToneMapKind::Reinhard, &mut data, 1.5, "output").unwrap();
        assert!(data.iter().all(|&v| v == 1.0));

        let mut zeros = vec![0.0; 3];
        normalize_linear(ToneMapKind::Reinhard, &mut zeros, 1.5, "output").unwrap();
        assert!(zeros.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn non_finite_input_is_reported() {
        let mut data = vec![0.0, f32::INFINITY];
        let err = normalize_linear(ToneMapKind::Mantiuk, &mut data, 1.0, "input").unwrap_err();
        assert_eq!(err, ToneMapError::NonFinite { operator: ToneMapKind::Mantiuk, stage: "input" });
    }

    #[test]
    fn luminance_mapping_keeps_chroma_ratios_at_full_saturation() {
        let mut rgb = vec![0.2, 0.4, 0.8];
        let old = Plane::from_vec(1, 1, vec![0.4]);
        let new = Plane::from_vec(1, 1, vec![0.8]);
        map_luminance(&mut rgb, &old, &new, 1.0);
        assert_abs_diff_eq!(rgb[0], 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(rgb[1], 0.8, epsilon = 1e-6);
        assert_abs_diff_eq!(rgb[2], 1.6, epsilon = 1e-6);
    }

    #[test]
    fn channel_plane_deinterleaves() {
        let rgb = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(channel_plane(&rgb, 2, 1, 1).data, vec![2.0, 5.0]);
    }
}
