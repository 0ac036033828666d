//! Exposure alignment module
//!
//! Median threshold bitmap (MTB) alignment: integer translations that register
//! every exposure against a reference exposure.

mod bitmap;
mod mtb;
pub mod types;


pub use mtb::{MtbAligner, ShiftEstimate};
pub use types::{AlignConfig, AlignmentReport, AlignmentWarning, Offset, ReferenceImage};
