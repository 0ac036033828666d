//! HDR reconstruction pipeline module
//!
//! This module turns a bracketed stack of 8-bit exposures into a floating-point
//! radiance map and three tonemapped previews. Stages run in order
//! (align, calibrate, merge), then the tonemap operators fan out over the
//! finished radiance map.

pub mod common;
pub mod image;
pub mod align;
pub mod calibrate;
pub mod merge;
pub mod tonemap;
pub mod conversions;
pub mod tiff;

pub use common::{
    CalibrationError,
    HdrError,
    InputError,
    PipelineTimings,
    Result,
    StepTiming,
    Timer,
    ToneMapError,
    WeightFunction,
};

pub use image::{
    ExposureImage,
    ExposureStack,
    RadianceMap,
    RgbImageData,
    ToneMappedImage,
};

pub use align::{
    AlignConfig,
    AlignmentReport,
    AlignmentWarning,
    MtbAligner,
    Offset,
    ReferenceImage,
};

pub use calibrate::{
    CalibrationConfig,
    CameraResponse,
    DebevecCalibrator,
};

pub use merge::DebevecMerger;

pub use tonemap::{
    Drago,
    Mantiuk,
    Reinhard,
    ToneMapJob,
    ToneMapKind,
    ToneMapOperator,
    ToneMapper,
};

pub use conversions::{
    HdrConfig,
    HdrConfigBuilder,
    HdrOutput,
    HdrPipeline,
    ToneMapResult,
};

pub use tiff::{
    ExposureReader,
    HdrImageWriter,
    OutputConfig,
    StandardTiffReader,
    StandardTiffWriter,
    TiffCompression,
};
