//! Common utilities module
//!
//! Error taxonomy, stage timings and the pixel weighting shared by calibration
//! and merging.

pub mod error;
pub mod timing;
pub mod weight;

pub use error::{CalibrationError, HdrError, InputError, Result, ToneMapError};
pub use timing::{PipelineTimings, StepTiming, Timer};
pub use weight::WeightFunction;
