//! sketchcam-bench: CLI tool for timing pipeline variants on image files.
//!
//! Runs one variant over an image file and prints per-stage timing and
//! count diagnostics. Useful for:
//!
//! - Measuring per-stage durations to find the slow stage
//! - Checking how many contours and triangles a scene produces
//! - Producing a reference output image for a given input
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin sketchcam-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use sketchcam_pipeline::{Frame, PipelineDiagnostics, VariantKind, codec};

/// Pipeline timing and diagnostics for sketchcam.
///
/// Runs a pipeline variant on a given image and prints detailed
/// per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "sketchcam-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Pipeline variant to run.
    #[arg(long, value_enum, default_value_t = Variant::Shapes)]
    variant: Variant,

    /// Write the first run's output frame to this file as JPEG.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,
}

/// Pipeline variant selection.
#[derive(Clone, Copy, ValueEnum)]
enum Variant {
    /// Binary line drawing.
    Sketch,
    /// Triangles filled on the original frame.
    Shapes,
}

impl From<Variant> for VariantKind {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Sketch => Self::Sketch,
            Variant::Shapes => Self::ShapeDetect,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let variant = VariantKind::from(cli.variant);

    let image = match image::open(&cli.image_path) {
        Ok(img) => img,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };
    let frame = Frame::Color(image.to_rgb8());

    eprintln!(
        "Image: {} ({}x{})",
        cli.image_path.display(),
        frame.width(),
        frame.height(),
    );
    eprintln!("Variant: {}", variant.name());
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match variant.run_with_diagnostics(&frame) {
            Ok((output, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write the output on the first run only.
                if run == 0
                    && let Some(ref path) = cli.output
                {
                    write_output(&output, path);
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    // Print summary when multiple runs.
    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Encode `frame` as JPEG and write it to `path`, reporting on stderr.
fn write_output(frame: &Frame, path: &std::path::Path) {
    let jpeg = match codec::encode_jpeg(frame) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error encoding output: {e}");
            return;
        }
    };
    match std::fs::write(path, &jpeg) {
        Ok(()) => eprintln!("Output written to {} ({} bytes)", path.display(), jpeg.len()),
        Err(e) => eprintln!("Error writing output to {}: {e}", path.display()),
    }
}

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    debug_assert!(!all_diagnostics.is_empty(), "no diagnostics to summarize");

    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    let Some(first) = all_diagnostics.first() else {
        println!("Warning: no diagnostics to summarize");
        return;
    };

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    // Per-stage means. Every run executes the same stage list, so the
    // stage at index `i` is the same stage in every run.
    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    for (i, stage) in first.stages.iter().enumerate() {
        let stage_durations: Vec<f64> = all_diagnostics
            .iter()
            .filter_map(|d| d.stages.get(i))
            .map(|s| s.duration.as_secs_f64() * 1000.0)
            .collect();

        let stage_mean = stage_durations.iter().sum::<f64>() / stage_durations.len() as f64;
        println!("{:<24} {stage_mean:>10.3}ms", stage.stage);
    }
}
