use std::io::Write;
use std::sync::{Arc, Mutex};

use super::hdr_fusion::guarded;
use super::*;
use crate::hdr_pipeline::align::AlignConfig;
use crate::hdr_pipeline::common::{HdrError, Result, ToneMapError};
use crate::hdr_pipeline::image::synthetic::{photograph, ramp_scene, uniform_image, BRACKET_TIMES};
use crate::hdr_pipeline::image::{ExposureStack, RadianceMap, RgbImageData};
use crate::hdr_pipeline::tiff::{ExposureReader, HdrImageWriter, OutputConfig, TiffCompression};
use crate::hdr_pipeline::tonemap::{Drago, Mantiuk, Reinhard, ToneMapJob, ToneMapKind, ToneMapper};

/// Serves `images[i]` for an input whose first byte is `i`.
struct MockReader {
    should_fail: bool,
    images: Vec<RgbImageData>,
}

impl ExposureReader for MockReader {
    fn read_rgb(&self, data: &[u8]) -> Result<RgbImageData> {
        if self.should_fail {
            return Err(HdrError::DecodeError("Mock decode error".to_string()));
        }
        let index = data.first().copied().unwrap_or(0) as usize;
        Ok(self.images[index].clone())
    }
}

#[derive(Default)]
struct Written {
    radiance: Vec<(usize, usize)>,
    ldr: Vec<RgbImageData>,
}

struct MockWriter {
    should_fail: bool,
    written: Arc<Mutex<Written>>,
}

impl HdrImageWriter for MockWriter {
    fn write_radiance(&self, image: &RadianceMap, output: &mut dyn Write, _config: &OutputConfig) -> Result<()> {
        if self.should_fail {
            return Err(HdrError::EncodeError("Mock encode error".to_string()));
        }
        output.write_all(b"radiance")?;
        self.written.lock().unwrap().radiance.push((image.width(), image.height()));
        Ok(())
    }

    fn write_ldr(&self, image: &RgbImageData, output: &mut dyn Write, _config: &OutputConfig) -> Result<()> {
        if self.should_fail {
            return Err(HdrError::EncodeError("Mock encode error".to_string()));
        }
        output.write_all(b"ldr")?;
        self.written.lock().unwrap().ldr.push(image.clone());
        Ok(())
    }
}

fn synthetic_stack() -> ExposureStack {
    photograph(&ramp_scene(48, 32), &BRACKET_TIMES)
}

fn mock_reader() -> MockReader {
    let images = synthetic_stack()
        .into_images()
        .into_iter()
        .map(|img| RgbImageData { width: img.width, height: img.height, data: img.data })
        .collect();
    MockReader { should_fail: false, images }
}

fn pipeline(config: HdrConfig) -> (HdrPipeline<MockReader, MockWriter>, Arc<Mutex<Written>>) {
    let written = Arc::new(Mutex::new(Written::default()));
    let pipeline = HdrPipeline::with_custom(
        mock_reader(),
        MockWriter { should_fail: false, written: written.clone() },
        config,
    );
    (pipeline, written)
}

fn failing_reinhard_config() -> HdrConfig {
    HdrConfig::builder()
        .tonemap_jobs(vec![
            ToneMapJob::new(Drago::default()),
            ToneMapJob::new(Reinhard { light_adapt: 2.0, ..Reinhard::default() }),
            ToneMapJob::new(Mantiuk::default()),
        ])
        .build()
}

#[test]
fn test_config_builder() {
    let config = HdrConfig::builder()
        .align(AlignConfig { coarse_search_radius: 2, ..AlignConfig::default() })
        .align_enabled(false)
        .parallel_tonemap(false)
        .workers(1)
        .output(OutputConfig { compression: TiffCompression::Lzw, predictor: Some(2) })
        .build();

    assert!(!config.align.enabled);
    assert_eq!(config.align.coarse_search_radius, 2);
    assert!(!config.parallel_tonemap);
    assert_eq!(config.workers, 1);
    assert_eq!(config.output.compression, TiffCompression::Lzw);
    assert_eq!(config.tonemap_jobs, ToneMapJob::reference_set());
}

#[test]
fn test_default_config() {
    let config = HdrConfig::default();
    assert!(config.align.enabled);
    assert!(config.parallel_tonemap);
    assert_eq!(config.workers, 3);
    assert_eq!(config.calibration.samples, 200);
    let kinds: Vec<ToneMapKind> = config.tonemap_jobs.iter().map(|j| j.kind()).collect();
    assert_eq!(kinds, ToneMapKind::ALL.to_vec());
}

#[test]
fn test_full_run_delivers_all_operators() {
    let (pipeline, _) = pipeline(HdrConfig::default());
    let output = pipeline.process(synthetic_stack()).unwrap();

    assert!(output.is_complete());
    assert_eq!((output.radiance.width(), output.radiance.height()), (48, 32));
    assert!(output.radiance.data().iter().all(|v| v.is_finite() && *v > 0.0));
    assert_eq!(output.alignment.reference, Some(1));

    let kinds: Vec<ToneMapKind> = output.tonemapped.iter().map(|r| r.operator).collect();
    assert_eq!(kinds, ToneMapKind::ALL.to_vec());

    for step in ["align", "calibrate", "merge", "tonemap/Drago", "tonemap/Reinhard", "tonemap/Mantiuk"] {
        assert!(output.timings.get_step(step).is_some(), "missing timing for {step}");
    }
}

#[test]
fn test_post_gain_is_applied_after_operator() {
    let (pipeline, _) = pipeline(HdrConfig::default());
    let output = pipeline.process(synthetic_stack()).unwrap();

    let drago = output.get(ToneMapKind::Drago).unwrap();
    assert_eq!(drago.post_gain, 3.0);
    let expected = Drago::default().tonemap(&output.radiance).unwrap().scaled(3.0);
    assert_eq!(drago.image, expected);

    let reinhard = output.get(ToneMapKind::Reinhard).unwrap();
    assert_eq!(reinhard.post_gain, 1.0);
    let (_, hi) = reinhard.image.range();
    assert!(hi <= 1.0);
}

#[test]
fn test_reinhard_failure_is_isolated() {
    let (pipeline, _) = pipeline(failing_reinhard_config());
    let output = pipeline.process(synthetic_stack()).unwrap();

    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].operator(), ToneMapKind::Reinhard);
    assert!(matches!(
        output.failure(ToneMapKind::Reinhard),
        Some(ToneMapError::InvalidParameter { name: "light_adapt", .. })
    ));

    assert!(output.get(ToneMapKind::Drago).is_some());
    assert!(output.get(ToneMapKind::Mantiuk).is_some());
    assert!(output.get(ToneMapKind::Reinhard).is_none());
    assert!(!output.is_complete());
    assert!(output.timings.get_step("tonemap/Reinhard").is_some());
}

#[test]
fn test_sequential_matches_parallel() {
    let (parallel, _) = pipeline(HdrConfig::default());
    let (sequential, _) = pipeline(HdrConfig::builder().parallel_tonemap(false).build());
    let (single_worker, _) = pipeline(HdrConfig::builder().workers(1).build());

    let a = parallel.process(synthetic_stack()).unwrap();
    let b = sequential.process(synthetic_stack()).unwrap();
    let c = single_worker.process(synthetic_stack()).unwrap();
    assert_eq!(a.radiance, b.radiance);
    for kind in ToneMapKind::ALL {
        assert_eq!(a.get(kind).unwrap().image, b.get(kind).unwrap().image);
        assert_eq!(a.get(kind).unwrap().image, c.get(kind).unwrap().image);
    }
}

#[test]
fn test_invalid_post_gain_fails_only_that_operator() {
    let config = HdrConfig::builder()
        .tonemap_jobs(vec![
            ToneMapJob::new(Drago::default()).with_post_gain(f32::NAN),
            ToneMapJob::new(Reinhard::default()),
        ])
        .build();
    let (pipeline, _) = pipeline(config);
    let output = pipeline.process(synthetic_stack()).unwrap();
    assert!(matches!(
        output.failure(ToneMapKind::Drago),
        Some(ToneMapError::InvalidParameter { name: "post_gain", .. })
    ));
    assert!(output.get(ToneMapKind::Reinhard).is_some());
}

#[test]
fn test_panic_becomes_tonemap_error() {
    let result = guarded(ToneMapKind::Mantiuk, || panic!("solver exploded"));
    assert_eq!(
        result.unwrap_err(),
        ToneMapError::Panicked { operator: ToneMapKind::Mantiuk, message: "solver exploded".to_string() }
    );
}

#[test]
fn test_alignment_can_be_disabled() {
    let (pipeline, _) = pipeline(HdrConfig::builder().align_enabled(false).build());
    let output = pipeline.process(synthetic_stack()).unwrap();
    assert_eq!(output.alignment.reference, None);
    assert!(output.alignment.offsets.is_empty());
    assert!(output.timings.get_step("align").is_none());
}

#[test]
fn test_calibration_failure_aborts_run() {
    let (pipeline, _) = pipeline(HdrConfig::default());
    let stack = ExposureStack::new(vec![uniform_image(8, 8, 128, 0.5), uniform_image(8, 8, 128, 1.0)]).unwrap();
    let err = pipeline.process(stack).unwrap_err();
    assert!(matches!(err, HdrError::Calibration(_)));
    assert_eq!(err.stage(), "calibrate");
}

#[test]
fn test_input_error_aborts_run() {
    let (pipeline, _) = pipeline(HdrConfig::default());
    let image = RgbImageData { width: 4, height: 4, data: vec![100; 48] };
    let err = pipeline.process_images(vec![image.clone(), image], &[2.0, 1.0]).unwrap_err();
    assert!(matches!(err, HdrError::Input(_)));
    assert_eq!(err.stage(), "input");
}

fn write_inputs(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    (0..3u8)
        .map(|i| {
            let path = dir.join(format!("exposure-{i}.tiff"));
            std::fs::write(&path, [i]).unwrap();
            path
        })
        .collect()
}

#[test]
fn test_process_files_writes_delivered_outputs() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let inputs = write_inputs(input_dir.path());
    let out = output_dir.path().join("results");

    let (pipeline, written) = pipeline(failing_reinhard_config());
    let output = pipeline.process_files(&inputs, &BRACKET_TIMES, &out).unwrap();

    assert_eq!(output.tonemapped.len(), 2);
    assert!(out.join(RADIANCE_FILE_NAME).exists());
    assert!(out.join(ldr_file_name(ToneMapKind::Drago)).exists());
    assert!(out.join(ldr_file_name(ToneMapKind::Mantiuk)).exists());
    assert!(!out.join(ldr_file_name(ToneMapKind::Reinhard)).exists());

    let written = written.lock().unwrap();
    assert_eq!(written.radiance, vec![(48, 32)]);
    assert_eq!(written.ldr.len(), 2);
    assert_eq!(written.ldr[0], output.tonemapped[0].to_rgb8());

    assert!(output.timings.get_step("read").is_some());
    assert!(output.timings.get_step("write").is_some());
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, _) = pipeline(HdrConfig::default());
    let missing = [dir.path().join("nope.tiff"), dir.path().join("nope2.tiff")];
    let err = pipeline.process_files(&missing, &[1.0, 2.0], dir.path()).unwrap_err();
    assert!(matches!(err, HdrError::InputReadError(_)));
}

#[test]
fn test_reader_failure() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_inputs(dir.path());
    let written = Arc::new(Mutex::new(Written::default()));
    let pipeline = HdrPipeline::with_custom(
        MockReader { should_fail: true, images: Vec::new() },
        MockWriter { should_fail: false, written: written.clone() },
        HdrConfig::default(),
    );

    let err = pipeline.process_files(&inputs, &BRACKET_TIMES, dir.path()).unwrap_err();
    assert!(matches!(err, HdrError::DecodeError(_)));
    assert!(written.lock().unwrap().radiance.is_empty());
}

#[test]
fn test_writer_failure() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_inputs(dir.path());
    let pipeline = HdrPipeline::with_custom(
        mock_reader(),
        MockWriter { should_fail: true, written: Arc::new(Mutex::new(Written::default())) },
        HdrConfig::default(),
    );

    let err = pipeline.process_files(&inputs, &BRACKET_TIMES, dir.path().join("out")).unwrap_err();
    assert!(matches!(err, HdrError::EncodeError(_)));
    assert_eq!(err.stage(), "write");
}
