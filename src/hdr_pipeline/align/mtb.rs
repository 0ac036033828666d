use tracing::{debug, info, instrument, warn};

use crate::hdr_pipeline::image::{ExposureImage, ExposureStack};

use super::bitmap::{gray_pyramid, BitErrors, MtbBitmap};
use super::types::{AlignConfig, AlignmentReport, AlignmentWarning, Offset};

/// Outcome of registering one exposure against the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftEstimate {
    pub offset: Offset,
    /// Bit errors at `offset` on the full-resolution bitmaps
    pub error: u64,
    /// Bit errors with no shift applied
    pub zero_offset_error: u64,
}

impl ShiftEstimate {
    pub fn improved(&self) -> bool {
        !self.offset.is_zero()
    }
}

/// Median threshold bitmap aligner.
pub struct MtbAligner {
    config: AlignConfig,
}

impl MtbAligner {
    pub fn new(config: AlignConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    pub fn align(&self, stack: ExposureStack) -> ExposureStack {
        self.align_with_report(stack).0
    }

    /// Shifts every exposure onto the reference exposure, which is passed
    /// through untouched. Exposures without an improving offset stay as they
    /// are and are listed in the report's warnings.
    #[instrument(skip_all, fields(images = stack.len(), width = stack.width(), height = stack.height()))]
    pub fn align_with_report(&self, stack: ExposureStack) -> (ExposureStack, AlignmentReport) {
        let reference_index = self.config.reference.resolve(stack.len());
        let images = stack.into_images();

        let pyramids: Vec<Vec<MtbBitmap>> = images.iter().map(|img| self.bitmap_pyramid(img)).collect();
        let reference = &pyramids[reference_index];

        let mut report = AlignmentReport {
            reference: Some(reference_index),
            offsets: Vec::with_capacity(images.len()),
            warnings: Vec::new(),
        };

        let mut aligned = Vec::with_capacity(images.len());
        for (index, image) in images.into_iter().enumerate() {
            if index == reference_index {
                report.offsets.push(Offset::ZERO);
                aligned.push(image);
                continue;
            }

            let estimate = self.search(reference, &pyramids[index]);
            debug!(
                index,
                offset = %estimate.offset,
                error = estimate.error,
                zero_offset_error = estimate.zero_offset_error,
                "Shift estimate"
            );

            if estimate.improved() {
                report.offsets.push(estimate.offset);
                aligned.push(image.translated(-estimate.offset.dx, -estimate.offset.dy));
            } else {
                let warning = AlignmentWarning {
                    index,
                    exposure_time: image.exposure_time,
                    zero_offset_error: estimate.zero_offset_error,
                };
                warn!("{}", warning);
                report.warnings.push(warning);
                report.offsets.push(Offset::ZERO);
                aligned.push(image);
            }
        }

        info!(
            reference = reference_index,
            shifted = report.offsets.iter().filter(|o| !o.is_zero()).count(),
            warnings = report.warnings.len(),
            "Alignment complete"
        );

        (ExposureStack::from_validated(aligned), report)
    }

    /// Shift of `moving` relative to `reference`, such that
    /// `moving(x, y) ≈ reference(x - dx, y - dy)`.
    pub fn estimate_shift(&self, reference: &ExposureImage, moving: &ExposureImage) -> ShiftEstimate {
        let reference = self.bitmap_pyramid(reference);
        let moving = self.bitmap_pyramid(moving);
        self.search(&reference, &moving)
    }

    fn bitmap_pyramid(&self, image: &ExposureImage) -> Vec<MtbBitmap> {
        gray_pyramid(
            image.luminance_u8(),
            image.width,
            image.height,
            self.config.max_coarse_dimension,
            self.config.max_levels,
        )
        .iter()
        .map(|level| MtbBitmap::from_gray(level, self.config.exclusion_range))
        .collect()
    }

    /// Coarse-to-fine search. Both pyramids come from same-sized images and so
    /// have the same depth.
    fn search(&self, reference: &[MtbBitmap], moving: &[MtbBitmap]) -> ShiftEstimate {
        let coarsest = reference.len().min(moving.len()) - 1;
        let mut offset = Offset::ZERO;

        for level in (0..=coarsest).rev() {
            let radius = if level == coarsest {
                self.config.coarse_search_radius
            } else {
                offset = offset.doubled();
                self.config.refine_search_radius
            };
            offset = best_in_window(&reference[level], &moving[level], offset, radius);
        }

        let zero = moving[0].count_errors(&reference[0], Offset::ZERO);
        let zero_offset_error = zero.map_or(0, |e| e.errors);
        let found = moving[0].count_errors(&reference[0], offset);

        match (found, zero) {
            (Some(found), Some(zero)) if !offset.is_zero() && found.beats(&zero) => ShiftEstimate {
                offset,
                error: found.errors,
                zero_offset_error,
            },
            _ => ShiftEstimate {
                offset: Offset::ZERO,
                error: zero_offset_error,
                zero_offset_error,
            },
        }
    }
}

/// Lowest error-rate offset in the window around `center`. Only a strictly
/// lower rate replaces the center, and offsets with too little overlap are
/// skipped.
fn best_in_window(reference: &MtbBitmap, moving: &MtbBitmap, center: Offset, radius: i32) -> Offset {
    let mut best = center;
    let mut best_error: Option<BitErrors> = moving.count_errors(reference, center);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx == 0 && dy == 0 {
                continue;
            }
            let candidate = Offset::new(center.dx + dx, center.dy + dy);
            let Some(error) = moving.count_errors(reference, candidate) else {
                continue;
            };
            if best_error.is_none_or(|best| error.beats(&best)) {
                best = candidate;
                best_error = Some(error);
            }
        }
    }
    best
}
