//! Pipeline configuration and output types

use std::time::Duration;

use crate::hdr_pipeline::align::{AlignConfig, AlignmentReport};
use crate::hdr_pipeline::calibrate::{CalibrationConfig, CameraResponse};
use crate::hdr_pipeline::common::{PipelineTimings, ToneMapError};
use crate::hdr_pipeline::image::{RadianceMap, RgbImageData, ToneMappedImage};
use crate::hdr_pipeline::tiff::OutputConfig;
use crate::hdr_pipeline::tonemap::{ToneMapJob, ToneMapKind};

/// Configuration for a full HDR fusion run
#[derive(Debug, Clone, PartialEq)]
pub struct HdrConfig {
    pub align: AlignConfig,
    pub calibration: CalibrationConfig,
    /// Operators to run over the radiance map, in reporting order
    pub tonemap_jobs: Vec<ToneMapJob>,
    /// Run the operators concurrently (true) or one after another
    pub parallel_tonemap: bool,
    /// Size of the tonemap worker pool
    pub workers: usize,
    pub output: OutputConfig,
}

impl Default for HdrConfig {
    fn default() -> Self {
        Self {
            align: AlignConfig::default(),
            calibration: CalibrationConfig::default(),
            tonemap_jobs: ToneMapJob::reference_set(),
            parallel_tonemap: true,
            workers: 3,
            output: OutputConfig::default(),
        }
    }
}

impl HdrConfig {
    pub fn builder() -> HdrConfigBuilder {
        HdrConfigBuilder::default()
    }
}

/// Builder for HdrConfig
#[derive(Default)]
pub struct HdrConfigBuilder {
    align: Option<AlignConfig>,
    align_enabled: Option<bool>,
    calibration: Option<CalibrationConfig>,
    tonemap_jobs: Option<Vec<ToneMapJob>>,
    parallel_tonemap: Option<bool>,
    workers: Option<usize>,
    output: Option<OutputConfig>,
}

impl HdrConfigBuilder {
    pub fn align(mut self, align: AlignConfig) -> Self {
        self.align = Some(align);
        self
    }

    /// Overrides `align.enabled` regardless of the order of calls.
    pub fn align_enabled(mut self, enabled: bool) -> Self {
        self.align_enabled = Some(enabled);
        self
    }

    pub fn calibration(mut self, calibration: CalibrationConfig) -> Self {
        self.calibration = Some(calibration);
        self
    }

    pub fn tonemap_jobs(mut self, jobs: Vec<ToneMapJob>) -> Self {
        self.tonemap_jobs = Some(jobs);
        self
    }

    pub fn parallel_tonemap(mut self, parallel: bool) -> Self {
        self.parallel_tonemap = Some(parallel);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn output(mut self, output: OutputConfig) -> Self {
        self.output = Some(output);
        self
    }

    pub fn build(self) -> HdrConfig {
        let default = HdrConfig::default();
        let mut align = self.align.unwrap_or(default.align);
        if let Some(enabled) = self.align_enabled {
            align.enabled = enabled;
        }
        HdrConfig {
            align,
            calibration: self.calibration.unwrap_or(default.calibration),
            tonemap_jobs: self.tonemap_jobs.unwrap_or(default.tonemap_jobs),
            parallel_tonemap: self.parallel_tonemap.unwrap_or(default.parallel_tonemap),
            workers: self.workers.unwrap_or(default.workers),
            output: self.output.unwrap_or(default.output),
        }
    }
}

/// A delivered tonemap result, tagged with its operator.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneMapResult {
    pub operator: ToneMapKind,
    /// Operator output with `post_gain` applied, not yet clamped
    pub image: ToneMappedImage,
    pub post_gain: f32,
    pub elapsed: Duration,
}

impl ToneMapResult {
    /// Clamped 8-bit rendition for LDR output.
    pub fn to_rgb8(&self) -> RgbImageData {
        self.image.to_rgb8()
    }
}

/// Outcome of a run that got past calibration: the radiance map plus
/// whichever tonemap results succeeded, with failures listed separately.
#[derive(Debug, Clone)]
pub struct HdrOutput {
    pub radiance: RadianceMap,
    pub response: CameraResponse,
    pub tonemapped: Vec<ToneMapResult>,
    pub failures: Vec<ToneMapError>,
    pub alignment: AlignmentReport,
    pub timings: PipelineTimings,
}

impl HdrOutput {
    pub fn get(&self, operator: ToneMapKind) -> Option<&ToneMapResult> {
        self.tonemapped.iter().find(|r| r.operator == operator)
    }

    pub fn failure(&self, operator: ToneMapKind) -> Option<&ToneMapError> {
        self.failures.iter().find(|e| e.operator() == operator)
    }

    /// True when every configured operator delivered a result.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
