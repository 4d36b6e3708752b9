//! restora: enhance low-quality still images from the command line.
//!
//! Runs the enhancement pipeline (denoise, contrast, sharpen,
//! super-resolution) on a single image or on every image in a directory,
//! or only analyzes an image and prints its blur, noise and brightness.
//!
//! # Usage
//!
//! ```text
//! restora --input photo.jpg --output out/ --model edsr --scale 4
//! restora --input photos/ --no-super-res --suffix _clean
//! restora --input photo.jpg --analyze-only --json
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use restora_io::{
    DEFAULT_SUFFIX, ModelResolver, ModelStore, enhance_input, load_image, process_directory,
};
use restora_pipeline::upscale::SUPPORTED_SCALES;
use restora_pipeline::{ImageEnhancer, StageConfig, StageKind, analyze};

/// Enhance low-quality images: denoise, contrast, sharpen and upscale.
#[derive(Parser, Debug)]
#[command(name = "restora", version)]
struct Cli {
    /// Input image, or a directory of images.
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory.
    #[arg(short, long, default_value = "./output_images")]
    output: PathBuf,

    /// Super-resolution model.
    #[arg(
        short,
        long,
        default_value = StageConfig::DEFAULT_MODEL,
        value_parser = ["edsr", "fsrcnn", "espcn", "lapsrn"],
    )]
    model: String,

    /// Upscaling factor (2, 3, 4 or 8, depending on the model).
    #[arg(short, long, default_value_t = StageConfig::DEFAULT_SCALE, value_parser = parse_scale)]
    scale: u32,

    /// Directory holding downloaded model weights.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Base URL to fetch model weights from instead of upstream.
    #[arg(long, value_name = "URL")]
    model_mirror: Option<String>,

    /// Non-local means filter strength.
    #[arg(long, default_value_t = StageConfig::DEFAULT_DENOISE_STRENGTH)]
    denoise_strength: f64,

    /// CLAHE clip limit.
    #[arg(long, default_value_t = StageConfig::DEFAULT_CLAHE_CLIP_LIMIT)]
    clahe_clip: f64,

    /// CLAHE tiles per axis.
    #[arg(long, default_value_t = StageConfig::DEFAULT_CLAHE_TILE_GRID)]
    clahe_grid: u32,

    /// Fixed gamma (default: derived from brightness).
    #[arg(long)]
    gamma: Option<f64>,

    /// Skip automatic brightness correction.
    #[arg(long)]
    no_auto_brightness: bool,

    /// Unsharp mask amount.
    #[arg(long, default_value_t = StageConfig::DEFAULT_SHARPEN_AMOUNT)]
    sharpen_amount: f64,

    /// Residuals at or below this magnitude are not sharpened.
    #[arg(long, default_value_t = StageConfig::DEFAULT_SHARPEN_THRESHOLD)]
    sharpen_threshold: f64,

    /// Pick the sharpen amount from how blurry the image is.
    #[arg(long)]
    adaptive_sharpen: bool,

    /// Disable noise reduction.
    #[arg(long)]
    no_denoise: bool,

    /// Disable contrast enhancement.
    #[arg(long)]
    no_contrast: bool,

    /// Disable sharpening.
    #[arg(long)]
    no_sharpen: bool,

    /// Disable super-resolution.
    #[arg(long)]
    no_super_res: bool,

    /// Only analyze the input image.
    #[arg(long)]
    analyze_only: bool,

    /// Appended to output file stems.
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    suffix: String,

    /// Full stage config as a JSON string.
    ///
    /// When provided, all other stage parameter flags are ignored.
    /// The JSON must be a valid `StageConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Print results as JSON instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Log debug detail.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Log warnings and errors only.
    #[arg(short, long)]
    quiet: bool,
}

fn parse_scale(s: &str) -> Result<u32, String> {
    let scale: u32 = s.parse().map_err(|e| format!("invalid scale '{s}': {e}"))?;
    if SUPPORTED_SCALES.contains(&scale) {
        Ok(scale)
    } else {
        Err(format!("scale must be one of {SUPPORTED_SCALES:?}"))
    }
}

/// Build a [`StageConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<StageConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let mut config = StageConfig {
        denoise_strength: cli.denoise_strength,
        clahe_clip_limit: cli.clahe_clip,
        clahe_tile_grid: cli.clahe_grid,
        gamma: cli.gamma,
        auto_brightness: !cli.no_auto_brightness,
        sharpen_amount: cli.sharpen_amount,
        sharpen_threshold: cli.sharpen_threshold,
        adaptive_sharpen: cli.adaptive_sharpen,
        model: cli.model.clone(),
        scale: cli.scale,
        ..StageConfig::default()
    };
    config.set_enabled(StageKind::Denoise, !cli.no_denoise);
    config.set_enabled(StageKind::Contrast, !cli.no_contrast);
    config.set_enabled(StageKind::Sharpen, !cli.no_sharpen);
    config.set_enabled(StageKind::SuperResolve, !cli.no_super_res);
    Ok(config)
}

fn model_store(cli: &Cli) -> ModelStore {
    let store = cli
        .models_dir
        .as_ref()
        .map_or_else(ModelStore::default, ModelStore::new);
    match cli.model_mirror {
        Some(ref mirror) => store.with_mirror(mirror.as_str()),
        None => store,
    }
}

fn init_logging(cli: &Cli) {
    let default_filter = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    if !cli.input.exists() {
        error!("input not found: {}", cli.input.display());
        return ExitCode::FAILURE;
    }

    if cli.analyze_only {
        return analyze_only(&cli.input, cli.json);
    }

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    log_config(&config);

    let resolver = ModelResolver::new(model_store(&cli));
    let mut enhancer = match ImageEnhancer::new(config, &resolver) {
        Ok(enhancer) => enhancer,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.input.is_dir() {
        run_batch(&mut enhancer, &cli)
    } else {
        run_single(&mut enhancer, &cli)
    }
}

fn analyze_only(input: &Path, json: bool) -> ExitCode {
    if !input.is_file() {
        error!("--analyze-only needs a single image file, got {}", input.display());
        return ExitCode::FAILURE;
    }
    let image = match load_image(input) {
        Ok(image) => image,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let report = analyze(&image);

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing analysis: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("File: {}", input.display());
        println!("{}", report.report());
    }
    ExitCode::SUCCESS
}

fn log_config(config: &StageConfig) {
    let state = |stage| {
        if config.is_enabled(stage) {
            "on"
        } else {
            "off"
        }
    };
    info!(
        "model {} x{}; denoise {}, contrast {}, sharpen {}, super-res {}",
        config.model.to_uppercase(),
        config.scale,
        state(StageKind::Denoise),
        state(StageKind::Contrast),
        state(StageKind::Sharpen),
        state(StageKind::SuperResolve),
    );
}

fn run_single(enhancer: &mut ImageEnhancer, cli: &Cli) -> ExitCode {
    let result = match enhance_input(enhancer, cli.input.as_path()) {
        Ok(result) => result,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let output = restora_io::batch::output_path(&cli.input, &cli.output, &cli.suffix);
    if let Err(e) = restora_io::try_save_image(result.enhanced(), &output) {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    if cli.json {
        let summary = serde_json::json!({
            "input": cli.input,
            "output": output,
            "analysis": result.analysis(),
            "diagnostics": result.diagnostics(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", result.analysis().report());
        println!();
        println!("{}", result.diagnostics().report());
        println!();
        println!("Saved {}", output.display());
    }
    ExitCode::SUCCESS
}

fn run_batch(enhancer: &mut ImageEnhancer, cli: &Cli) -> ExitCode {
    let report = match process_directory(enhancer, &cli.input, &cli.output, &cli.suffix) {
        Ok(report) => report,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing batch report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        for entry in &report.entries {
            match entry.outcome {
                restora_io::BatchOutcome::Enhanced { elapsed } => println!(
                    "ok     {} -> {} ({:.2}s)",
                    entry.input.display(),
                    entry.output.display(),
                    elapsed.as_secs_f64(),
                ),
                restora_io::BatchOutcome::Failed { ref error } => {
                    println!("failed {}: {error}", entry.input.display());
                }
            }
        }
        println!("{report}");
    }
    ExitCode::SUCCESS
}
