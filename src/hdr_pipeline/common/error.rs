use thiserror::Error;

use crate::hdr_pipeline::tonemap::ToneMapKind;

/// Violations of the exposure stack contract. Raised before any stage runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Exposure stack needs at least 2 images, got {0}")]
    TooFewImages(usize),

    #[error("Got {images} images but {times} exposure times")]
    ExposureCountMismatch { images: usize, times: usize },

    #[error("Image {index} is empty: width={width}, height={height}")]
    EmptyImage { index: usize, width: usize, height: usize },

    #[error("Image {index} holds {actual} samples, expected {expected}")]
    BufferSize { index: usize, expected: usize, actual: usize },

    #[error("Image {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        index: usize,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    #[error("Exposure time of image {index} must be finite and positive, got {time}")]
    NonPositiveExposure { index: usize, time: f32 },

    #[error("Exposure times must strictly increase: image {index} has {time}s after {previous}s")]
    NonIncreasingExposure { index: usize, time: f32, previous: f32 },
}

/// Failures of the response-curve least-squares solve.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("Response calibration needs at least 2 exposures, got {0}")]
    TooFewImages(usize),

    #[error("Channel {channel}: {distinct} distinct usable pixel values sampled, need at least {required}")]
    InsufficientSamples { channel: usize, distinct: usize, required: usize },

    #[error("Channel {channel}: response system is singular (rank {rank} of {unknowns})")]
    Singular { channel: usize, rank: usize, unknowns: usize },

    #[error("Channel {channel}: response curve contains non-finite values")]
    NonFinite { channel: usize },
}

/// Failure of a single tonemap operator. Never aborts the pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToneMapError {
    #[error("{operator}: invalid parameter {name}={value} ({reason})")]
    InvalidParameter {
        operator: ToneMapKind,
        name: &'static str,
        value: f32,
        reason: &'static str,
    },

    #[error("{operator}: non-finite values after {stage}")]
    NonFinite { operator: ToneMapKind, stage: &'static str },

    #[error("{operator}: operator panicked: {message}")]
    Panicked { operator: ToneMapKind, message: String },
}

impl ToneMapError {
    pub fn operator(&self) -> ToneMapKind {
        match self {
            ToneMapError::InvalidParameter { operator, .. }
            | ToneMapError::NonFinite { operator, .. }
            | ToneMapError::Panicked { operator, .. } => *operator,
        }
    }
}

#[derive(Error, Debug)]
pub enum HdrError {
    #[error("Invalid exposure stack: {0}")]
    Input(#[from] InputError),

    #[error("Response calibration failed: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode TIFF image: {0}")]
    DecodeError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl HdrError {
    /// Name of the pipeline stage that raised the error.
    pub fn stage(&self) -> &'static str {
        match self {
            HdrError::Input(_) => "input",
            HdrError::Calibration(_) => "calibrate",
            HdrError::InputReadError(_) | HdrError::DecodeError(_) | HdrError::UnsupportedFormat(_) => "read",
            HdrError::OutputWriteError(_) | HdrError::EncodeError(_) => "write",
            HdrError::IoError(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, HdrError>;
