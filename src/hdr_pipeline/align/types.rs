//! Alignment configuration and report types

use std::fmt;

/// Which exposure every other exposure is registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceImage {
    /// `len / 2`; for even stacks this is the upper of the two middle exposures.
    #[default]
    Middle,
    /// Explicit index, clamped to the last exposure.
    Index(usize),
}

impl ReferenceImage {
    pub fn resolve(&self, len: usize) -> usize {
        match *self {
            ReferenceImage::Middle => len / 2,
            ReferenceImage::Index(i) => i.min(len.saturating_sub(1)),
        }
    }
}

/// Configuration for MTB alignment
#[derive(Debug, Clone, PartialEq)]
pub struct AlignConfig {
    /// Skip alignment entirely and pass the stack through
    pub enabled: bool,
    pub reference: ReferenceImage,
    /// Downsample until the longer side is at most this many pixels
    pub max_coarse_dimension: usize,
    /// Upper bound on pyramid depth, full resolution included
    pub max_levels: usize,
    /// Search window half-width at the coarsest level
    pub coarse_search_radius: i32,
    /// Search window half-width around the propagated offset at finer levels
    pub refine_search_radius: i32,
    /// Pixels within this distance of the median are left out of the comparison
    pub exclusion_range: u8,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reference: ReferenceImage::Middle,
            max_coarse_dimension: 64,
            max_levels: 6,
            coarse_search_radius: 4,
            refine_search_radius: 1,
            exclusion_range: 4,
        }
    }
}

/// Integer translation of image content, `moving(x, y) = reference(x - dx, y - dy)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    pub const ZERO: Offset = Offset { dx: 0, dy: 0 };

    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    pub(crate) fn doubled(self) -> Self {
        Self::new(self.dx * 2, self.dy * 2)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:+}, {:+})", self.dx, self.dy)
    }
}

/// No improving offset was found for an exposure; it was kept unshifted.
///
/// Not an error: the stack may already be registered, or too dissimilar for
/// the bitmap heuristic.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentWarning {
    pub index: usize,
    pub exposure_time: f32,
    /// Bit errors at zero offset on the full-resolution bitmaps
    pub zero_offset_error: u64,
}

impl fmt::Display for AlignmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "exposure {} ({}s): no improving offset, kept zero offset ({} bit errors)",
            self.index, self.exposure_time, self.zero_offset_error
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignmentReport {
    /// Index of the reference exposure, `None` when alignment was disabled
    pub reference: Option<usize>,
    /// Shift found for each exposure, zero for the reference
    pub offsets: Vec<Offset>,
    pub warnings: Vec<AlignmentWarning>,
}
