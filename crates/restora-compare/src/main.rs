//! Compare an enhanced image against its original.
//!
//! Prints PSNR and SSIM (the enhanced image is resized to the original's
//! dimensions first) and optionally writes a side-by-side composite.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use restora_io::{Comparison, compare_files, try_save_image};

/// Compare an enhanced image against its original: PSNR, SSIM and an
/// optional side-by-side composite.
#[derive(Parser, Debug)]
#[command(name = "restora-compare", version)]
struct Args {
    /// The original (ground truth) image.
    #[arg(long)]
    original: PathBuf,

    /// The enhanced image.
    #[arg(long)]
    enhanced: PathBuf,

    /// Write a side-by-side composite to this path.
    #[arg(long, value_name = "PATH")]
    side_by_side: Option<PathBuf>,

    /// Print metrics as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let comparison = match compare_files(&args.original, &args.enhanced) {
        Ok(comparison) => comparison,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&comparison.metrics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing metrics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_metrics(&args, &comparison);
    }

    if let Some(ref path) = args.side_by_side {
        let composite = comparison.composite();
        if let Err(e) = try_save_image(&composite, path) {
            error!("{e}");
            return ExitCode::FAILURE;
        }
        info!(
            "composite written to {} ({}x{})",
            path.display(),
            composite.width(),
            composite.height(),
        );
    }

    ExitCode::SUCCESS
}

fn print_metrics(args: &Args, comparison: &Comparison) {
    println!("Quality Comparison\n{}", "=".repeat(40));
    for (label, path, image) in [
        ("Original", &args.original, &comparison.original),
        ("Enhanced", &args.enhanced, &comparison.enhanced),
    ] {
        println!(
            "  {label}: {} ({}x{})",
            path.display(),
            image.width(),
            image.height(),
        );
    }
    println!("  {}", comparison.metrics);
}
