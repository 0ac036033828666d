use std::any::Any;
use std::fs::File;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Duration;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{error, info, info_span, instrument, warn, Span};

use crate::hdr_pipeline::{
    align::{AlignmentReport, MtbAligner},
    calibrate::DebevecCalibrator,
    common::error::{HdrError, Result},
    common::{PipelineTimings, Timer, ToneMapError},
    conversions::types::{HdrConfig, HdrOutput, ToneMapResult},
    image::{ExposureStack, RadianceMap, RgbImageData, ToneMappedImage},
    merge::DebevecMerger,
    tiff::{ExposureReader, HdrImageWriter, StandardTiffReader, StandardTiffWriter},
    tonemap::{ToneMapJob, ToneMapKind, ToneMapper},
};

/// File name of the radiance map inside the output directory.
pub const RADIANCE_FILE_NAME: &str = "hdr-debevec.tiff";

struct JobOutcome {
    operator: ToneMapKind,
    post_gain: f32,
    elapsed: Duration,
    result: std::result::Result<ToneMappedImage, ToneMapError>,
}

pub struct HdrPipeline<R: ExposureReader, W: HdrImageWriter> {
    reader: R,
    writer: W,
    config: HdrConfig,
}

impl HdrPipeline<StandardTiffReader, StandardTiffWriter> {
    pub fn new(config: HdrConfig) -> Self {
        Self {
            reader: StandardTiffReader,
            writer: StandardTiffWriter,
            config,
        }
    }
}

impl<R: ExposureReader, W: HdrImageWriter> HdrPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: HdrConfig) -> Self {
        Self {
            reader,
            writer,
            config,
        }
    }

    /// Aligns, calibrates and merges the stack, then runs every configured
    /// tonemap operator.
    ///
    /// Input and calibration errors abort the run. Tonemap failures do not:
    /// they are listed in [`HdrOutput::failures`] next to the results of the
    /// operators that succeeded.
    #[instrument(skip_all, fields(images = stack.len(), width = stack.width(), height = stack.height()))]
    pub fn process(&self, stack: ExposureStack) -> Result<HdrOutput> {
        info!("Starting HDR fusion");
        let mut timings = PipelineTimings::new();

        let (stack, alignment) = if self.config.align.enabled {
            let _span = info_span!("align").entered();
            let aligner = MtbAligner::new(self.config.align.clone());
            timings.time("align", || aligner.align_with_report(stack))
        } else {
            (stack, AlignmentReport::default())
        };

        let response = {
            let _span = info_span!("calibrate").entered();
            let calibrator = DebevecCalibrator::new(self.config.calibration.clone());
            timings.time("calibrate", || calibrator.calibrate(&stack))?
        };

        let radiance = {
            let _span = info_span!("merge").entered();
            timings.time("merge", || DebevecMerger::new().merge(&stack, &response))
        };

        let outcomes = self.run_tonemaps(&radiance);

        let mut tonemapped = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            timings.add_step(format!("tonemap/{}", outcome.operator), outcome.elapsed);
            match outcome.result {
                Ok(image) => tonemapped.push(ToneMapResult {
                    operator: outcome.operator,
                    image,
                    post_gain: outcome.post_gain,
                    elapsed: outcome.elapsed,
                }),
                Err(e) => {
                    error!(operator = %outcome.operator, "Tonemapping failed: {}", e);
                    failures.push(e);
                }
            }
        }

        info!(
            delivered = tonemapped.len(),
            failed = failures.len(),
            "HDR fusion complete"
        );

        Ok(HdrOutput {
            radiance,
            response,
            tonemapped,
            failures,
            alignment,
            timings,
        })
    }

    /// Builds the stack from decoded images and their exposure times, then
    /// runs [`process`](Self::process).
    pub fn process_images(&self, images: Vec<RgbImageData>, exposure_times: &[f32]) -> Result<HdrOutput> {
        let stack = ExposureStack::from_images(images, exposure_times)?;
        self.process(stack)
    }

    /// Outcomes in configuration order, whatever order the workers finish in.
    fn run_tonemaps(&self, radiance: &RadianceMap) -> Vec<JobOutcome> {
        let jobs = &self.config.tonemap_jobs;
        let parent = Span::current();

        if !self.config.parallel_tonemap || jobs.len() < 2 {
            return jobs.iter().map(|job| run_job(job, radiance, &parent)).collect();
        }

        match ThreadPoolBuilder::new()
            .num_threads(self.config.workers.max(1))
            .thread_name(|i| format!("tonemap-{i}"))
            .build()
        {
            Ok(pool) => pool.install(|| {
                jobs.par_iter()
                    .map(|job| run_job(job, radiance, &parent))
                    .collect()
            }),
            Err(e) => {
                warn!("Could not start tonemap workers ({}), running sequentially", e);
                jobs.iter().map(|job| run_job(job, radiance, &parent)).collect()
            }
        }
    }

    /// Reads the exposures, processes them and writes every output image to
    /// `output_dir`.
    #[instrument(skip(self, inputs, output_dir), fields(inputs = inputs.len()))]
    pub fn process_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        inputs: &[P],
        exposure_times: &[f32],
        output_dir: Q,
    ) -> Result<HdrOutput> {
        let mut read_timings = PipelineTimings::new();
        let images = {
            let _span = info_span!("read_inputs").entered();
            read_timings.time("read", || {
                inputs
                    .iter()
                    .map(|path| self.read_exposure(path.as_ref()))
                    .collect::<Result<Vec<_>>>()
            })?
        };

        let mut output = self.process_images(images, exposure_times)?;

        let mut write_timings = PipelineTimings::new();
        {
            let _span = info_span!("write_outputs").entered();
            write_timings.time("write", || self.write_outputs(&output, output_dir.as_ref()))?;
        }

        let mut timings = read_timings;
        timings.extend(&output.timings);
        timings.extend(&write_timings);
        output.timings = timings;
        Ok(output)
    }

    fn read_exposure(&self, path: &Path) -> Result<RgbImageData> {
        info!(input = %path.display(), "Reading exposure");
        let data = std::fs::read(path)
            .map_err(|e| HdrError::InputReadError(format!("{}: {}", path.display(), e)))?;
        self.reader.read_rgb(&data)
    }

    /// Writes the radiance map and one LDR file per delivered operator.
    /// Operators that failed have no file.
    pub fn write_outputs(&self, output: &HdrOutput, output_dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(output_dir)
            .map_err(|e| HdrError::OutputWriteError(format!("{}: {}", output_dir.display(), e)))?;

        let mut written = Vec::with_capacity(1 + output.tonemapped.len());

        let path = output_dir.join(RADIANCE_FILE_NAME);
        let mut file = create_output(&path)?;
        self.writer
            .write_radiance(&output.radiance, &mut file, &self.config.output)?;
        written.push(path);

        for result in &output.tonemapped {
            let path = output_dir.join(ldr_file_name(result.operator));
            let mut file = create_output(&path)?;
            self.writer
                .write_ldr(&result.to_rgb8(), &mut file, &self.config.output)?;
            written.push(path);
        }

        info!(files = written.len(), output = %output_dir.display(), "Outputs written");
        Ok(written)
    }

    pub fn config(&self) -> &HdrConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: HdrConfig) {
        self.config = config;
    }
}

pub fn ldr_file_name(operator: ToneMapKind) -> String {
    format!("ldr-{operator}.tiff")
}

fn create_output(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| HdrError::OutputWriteError(format!("{}: {}", path.display(), e)))
}

/// Runs one operator, converting a panic into a `ToneMapError` so that the
/// other jobs are unaffected.
fn run_job(job: &ToneMapJob, radiance: &RadianceMap, parent: &Span) -> JobOutcome {
    let operator = job.kind();
    let _span = info_span!(parent: parent, "tonemap", %operator).entered();
    let timer = Timer::start(operator.name());

    let result = if !(job.post_gain.is_finite() && job.post_gain > 0.0) {
        Err(ToneMapError::InvalidParameter {
            operator,
            name: "post_gain",
            value: job.post_gain,
            reason: "must be positive",
        })
    } else {
        guarded(operator, || job.operator.tonemap(radiance)).map(|image| {
            if job.post_gain == 1.0 {
                image
            } else {
                image.scaled(job.post_gain)
            }
        })
    };

    let (_, elapsed) = timer.stop();
    info!(elapsed_ms = elapsed.as_secs_f64() * 1000.0, ok = result.is_ok(), "Operator finished");
    JobOutcome {
        operator,
        post_gain: job.post_gain,
        elapsed,
        result,
    }
}

/// Runs `f`, turning a panic into `ToneMapError::Panicked`.
pub(super) fn guarded(
    operator: ToneMapKind,
    f: impl FnOnce() -> std::result::Result<ToneMappedImage, ToneMapError>,
) -> std::result::Result<ToneMappedImage, ToneMapError> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(ToneMapError::Panicked {
            operator,
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
