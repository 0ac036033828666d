use tracing::{debug, instrument};

use crate::hdr_pipeline::common::ToneMapError;
use crate::hdr_pipeline::image::plane::Plane;
use crate::hdr_pipeline::image::{RadianceMap, ToneMappedImage};

use super::luminance::{check_param, log_floor, map_luminance, normalize_linear};
use super::types::{ToneMapKind, ToneMapper};

/// Exponent of the contrast transducer.
const RESPONSE_POWER: f32 = 0.4185;
const MAX_ITERATIONS: usize = 100;
/// Squared relative residual at which the solver stops.
const TARGET_ERROR: f64 = 1e-6;

/// Contrast mapping (Mantiuk et al., 2006).
///
/// Log-luminance gradients are taken on every level of a pyramid, scaled in
/// a perceptual response space, and integrated back with conjugate
/// gradients.
#[derive(Debug, Clone, PartialEq)]
pub struct Mantiuk {
    pub gamma: f32,
    /// Contrast scale factor; values below 1 compress.
    pub scale: f32,
    pub saturation: f32,
}

impl Default for Mantiuk {
    fn default() -> Self {
        Self {
            gamma: 1.3,
            scale: 0.85,
            saturation: 0.9,
        }
    }
}

impl ToneMapper for Mantiuk {
    fn kind(&self) -> ToneMapKind {
        ToneMapKind::Mantiuk
    }

    fn validate(&self) -> Result<(), ToneMapError> {
        let kind = self.kind();
        check_param(kind, "gamma", self.gamma, self.gamma > 0.0, "must be positive")?;
        check_param(kind, "scale", self.scale, self.scale > 0.0, "must be positive")?;
        check_param(kind, "saturation", self.saturation, self.saturation >= 0.0, "must not be negative")
    }

    #[instrument(skip_all, fields(operator = "Mantiuk"))]
    fn tonemap(&self, radiance: &RadianceMap) -> Result<ToneMappedImage, ToneMapError> {
        self.validate()?;
        let kind = self.kind();
        let (w, h) = (radiance.width(), radiance.height());

        let mut img = radiance.data().to_vec();
        normalize_linear(kind, &mut img, 1.0, "input")?;

        let gray = Plane::luminance_of(w, h, &img);
        let log_gray = gray.map(log_floor);

        let mut pyramid = contrast_pyramid(&log_gray);
        for (gx, gy) in pyramid.iter_mut() {
            *gx = gx.map(|c| self.map_contrast(c));
            *gy = gy.map(|c| self.map_contrast(c));
        }
        let right = divergence(&pyramid, w, h);

        let solved = solve(&right, log_gray);
        if !solved.is_finite() {
            return Err(ToneMapError::NonFinite { operator: kind, stage: "contrast integration" });
        }

        let new_lum = solved.map(f32::exp);
        map_luminance(&mut img, &gray, &new_lum, self.saturation);
        normalize_linear(kind, &mut img, self.gamma, "output")?;
        Ok(ToneMappedImage::new(w, h, img))
    }
}

impl Mantiuk {
    #[inline]
    fn map_contrast(&self, c: f32) -> f32 {
        signed_pow(self.scale * signed_pow(c, RESPONSE_POWER), 1.0 / RESPONSE_POWER)
    }
}

#[inline]
fn signed_pow(v: f32, p: f32) -> f32 {
    v.signum() * v.abs().powf(p)
}

/// Forward x/y differences per level, halving the layer between levels.
/// `floor(log2(min(w, h)))` levels.
fn contrast_pyramid(src: &Plane) -> Vec<(Plane, Plane)> {
    let min_dim = src.w.min(src.h);
    if min_dim == 0 {
        return Vec::new();
    }
    let levels = min_dim.ilog2() as usize;
    let mut out = Vec::with_capacity(levels);
    let mut layer = src.clone();
    for level in 0..levels {
        out.push((layer.forward_diff_x(), layer.forward_diff_y()));
        if level + 1 < levels {
            layer = layer.resized(layer.w / 2, layer.h / 2);
        }
    }
    out
}

/// Sum over all levels of the backward-difference divergence, coarsest
/// first, upsampling the running total to each finer level.
fn divergence(pyramid: &[(Plane, Plane)], w: usize, h: usize) -> Plane {
    let Some((coarsest, _)) = pyramid.last() else {
        return Plane::new(w, h);
    };
    let mut sum = Plane::new(coarsest.w, coarsest.h);
    for (gx, gy) in pyramid.iter().rev() {
        sum = sum.resized(gx.w, gx.h);
        sum.add_scaled(1.0, &gx.backward_diff_x());
        sum.add_scaled(1.0, &gy.backward_diff_y());
    }
    sum
}

/// The linear operator whose right-hand side is the mapped divergence.
fn product(x: &Plane) -> Plane {
    divergence(&contrast_pyramid(x), x.w, x.h)
}

/// Conjugate gradients from `x0`. Returns the iterate with the smallest
/// residual seen, stopping early on a vanishing step or non-finite values.
fn solve(right: &Plane, x0: Plane) -> Plane {
    let target = right.dot(right) * TARGET_ERROR;

    let mut x = x0;
    let mut r = right.clone();
    r.add_scaled(-1.0, &product(&x));
    let mut p = r.clone();
    let mut rr = r.dot(&r);

    let mut best = x.clone();
    let mut best_rr = rr;
    let mut iterations = 0;

    while iterations < MAX_ITERATIONS && rr > target {
        let ap = product(&p);
        let pap = p.dot(&ap);
        if pap == 0.0 || !pap.is_finite() {
            break;
        }
        let alpha = (rr / pap) as f32;
        r.add_scaled(-alpha, &ap);
        x.add_scaled(alpha, &p);
        iterations += 1;

        let new_rr = r.dot(&r);
        if !new_rr.is_finite() || !x.is_finite() {
            break;
        }
        if new_rr < best_rr {
            best_rr = new_rr;
            best.data.copy_from_slice(&x.data);
        }

        let beta = (new_rr / rr) as f32;
        for (pv, &rv) in p.data.iter_mut().zip(&r.data) {
            *pv = rv + beta * *pv;
        }
        rr = new_rr;
    }

    debug!(iterations, residual = best_rr, target, "Contrast integration finished");
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pyramid_depth_follows_smaller_side() {
        let p = Plane::new(40, 17);
        let pyramid = contrast_pyramid(&p);
        assert_eq!(pyramid.len(), 4);
        let dims: Vec<(usize, usize)> = pyramid.iter().map(|(gx, _)| (gx.w, gx.h)).collect();
        assert_eq!(dims, vec![(40, 17), (20, 8), (10, 4), (5, 2)]);
    }

    #[test]
    fn single_row_has_no_levels() {
        assert!(contrast_pyramid(&Plane::new(9, 1)).is_empty());
        assert_eq!(divergence(&[], 9, 1), Plane::new(9, 1));
    }

    #[test]
    fn identity_scale_keeps_contrast() {
        let op = Mantiuk { scale: 1.0, ..Mantiuk::default() };
        for c in [-0.7f32, -0.01, 0.0, 0.2, 1.5] {
            assert!((op.map_contrast(c) - c).abs() < 1e-5, "c = {c}");
        }
    }

    #[test]
    fn compression_shrinks_contrast() {
        let op = Mantiuk::default();
        assert!(op.map_contrast(0.5) < 0.5);
        assert!(op.map_contrast(-0.5) > -0.5);
    }

    #[test]
    fn solver_keeps_exact_start() {
        let x: Plane = Plane::from_vec(8, 8, (0..64).map(|i| (i as f32 * 0.37).sin()).collect());
        let right = product(&x);
        let solved = solve(&right, x.clone());
        assert_eq!(solved, x);
    }
}
