use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use hdr_fusion_rs::hdr_pipeline::{HdrConfig, HdrPipeline, OutputConfig, TiffCompression};
use hdr_fusion_rs::logger;

use tracing::{error, info};

/// Fuse bracketed exposures into an HDR radiance map and tonemapped renditions.
#[derive(Parser, Debug)]
#[command(name = "hdr_fusion_rs", version, about)]
struct Args {
    /// Directory containing the bracketed 8-bit TIFF exposures
    input_dir: PathBuf,

    /// Directory for hdr-debevec.tiff and the ldr-<Operator>.tiff files
    #[arg(default_value = "results")]
    output_dir: PathBuf,

    /// Exposure times in seconds, shortest first (fractions like 1/6 allowed)
    #[arg(
        short,
        long,
        value_delimiter = ',',
        value_parser = parse_exposure,
        default_values = ["1/6", "1.3", "5.0"]
    )]
    times: Vec<f32>,

    /// Run the tonemap operators one after another
    #[arg(long)]
    sequential: bool,

    /// Skip median threshold bitmap alignment
    #[arg(long)]
    no_align: bool,

    /// Compression for the written TIFF files
    #[arg(long, value_enum, default_value_t = CompressionArg::None)]
    compression: CompressionArg,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompressionArg {
    None,
    Lzw,
    Deflate,
}

impl From<CompressionArg> for TiffCompression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => TiffCompression::None,
            CompressionArg::Lzw => TiffCompression::Lzw,
            CompressionArg::Deflate => TiffCompression::DeflateBalanced,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init_with_level(if args.verbose { "debug" } else { "info" });

    let start = Instant::now();
    info!("Starting hdr_fusion_rs...");

    let inputs = collect_inputs(&args.input_dir)?;
    info!(
        "Inputs: {}",
        inputs
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!("Exposure times: {:?}", args.times);

    let config = HdrConfig::builder()
        .align_enabled(!args.no_align)
        .parallel_tonemap(!args.sequential)
        .output(OutputConfig {
            compression: args.compression.into(),
            predictor: None,
        })
        .build();
    let pipeline = HdrPipeline::new(config);

    let output = pipeline
        .process_files(&inputs, &args.times, &args.output_dir)
        .with_context(|| format!("HDR fusion of {} failed", args.input_dir.display()))?;

    for failure in &output.failures {
        error!(operator = %failure.operator(), "No output: {}", failure);
    }
    info!("\n{}", output.timings.summary());
    info!(
        delivered = output.tonemapped.len(),
        failed = output.failures.len(),
        "Finished in {:.3}s",
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

/// TIFF files in `dir`, ordered darkest to brightest by naming convention.
fn collect_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        let is_tiff = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"));
        if path.is_file() && is_tiff {
            inputs.push(path);
        }
    }
    anyhow::ensure!(!inputs.is_empty(), "no TIFF files found in {}", dir.display());

    inputs.sort_by_cached_key(|p| exposure_order_key(&p.file_name().unwrap_or_default().to_string_lossy()));
    Ok(inputs)
}

/// `_under` names first, `_over` names last, everything else by name.
fn exposure_order_key(name: &str) -> (bool, bool, String) {
    (name.contains("_over"), !name.contains("_under"), name.to_string())
}

fn parse_exposure(s: &str) -> Result<f32, String> {
    let value = match s.split_once('/') {
        Some((num, den)) => {
            let num: f32 = num.trim().parse().map_err(|e| format!("{s}: {e}"))?;
            let den: f32 = den.trim().parse().map_err(|e| format!("{s}: {e}"))?;
            num / den
        }
        None => s.trim().parse().map_err(|e| format!("{s}: {e}"))?,
    };
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("{s}: exposure time must be positive"))
    }
}
