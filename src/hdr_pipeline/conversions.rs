//! Pipeline orchestration module
//!
//! Runs align, calibrate and merge in order, then fans the radiance map out
//! to the configured tonemap operators and collects every outcome.

mod hdr_fusion;
pub mod types;

#[cfg(test)]
mod tests;

pub use hdr_fusion::{ldr_file_name, HdrPipeline, RADIANCE_FILE_NAME};
pub use types::{HdrConfig, HdrConfigBuilder, HdrOutput, ToneMapResult};
