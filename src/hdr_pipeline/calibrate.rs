//! Camera response calibration module
//!
//! Recovers the per-channel log response curve of the camera from the
//! exposure stack (Debevec & Malik, 1997).

mod debevec;
mod sampling;
pub mod types;

#[cfg(test)]
mod tests;

pub use debevec::DebevecCalibrator;
pub use sampling::stratified_locations;
pub use types::{CalibrationConfig, CameraResponse};
