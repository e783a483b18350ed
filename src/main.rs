//! heic2jpg CLI
//!
//! Converts HEIC/HEIF files to JPEG in place, deleting each source once its
//! JPEG has been verified.

use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::{error, info};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use heic2jpg::{
    pipeline, CancelToken, ChromaSubsampling, ColorMode, ProgressReporter, RunConfig, RunSummary,
    StandardCodec,
};

const ABOUT: &str = r#"
heic2jpg - convert HEIC/HEIF photos to JPEG in place

Each source is deleted once its JPEG has been written and verified.

Examples:
  heic2jpg ~/Pictures                      convert everything under a folder
  heic2jpg -y -q 85 a.heic b.heic          convert two files without asking
  heic2jpg --icc preserve-source ~/Photos  keep the original color profile
  heic2jpg --json --progress ~/Photos      machine-readable output
"#;

/// Minimum interval between progress tally lines
const PROGRESS_INTERVAL_MS: u64 = 200;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum IccArg {
    /// Convert to sRGB and embed the sRGB profile
    #[value(alias = "srgb")]
    ConvertToStandard,
    /// Embed the source profile unchanged
    #[value(alias = "keep")]
    PreserveSource,
    /// Embed no profile
    #[value(alias = "none")]
    Strip,
}

impl From<IccArg> for ColorMode {
    fn from(arg: IccArg) -> Self {
        match arg {
            IccArg::ConvertToStandard => ColorMode::ConvertToStandard,
            IccArg::PreserveSource => ColorMode::PreserveSource,
            IccArg::Strip => ColorMode::Strip,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SubsamplingArg {
    #[value(name = "444")]
    Yuv444,
    #[value(name = "422")]
    Yuv422,
    #[value(name = "420")]
    Yuv420,
}

impl From<SubsamplingArg> for ChromaSubsampling {
    fn from(arg: SubsamplingArg) -> Self {
        match arg {
            SubsamplingArg::Yuv444 => ChromaSubsampling::Yuv444,
            SubsamplingArg::Yuv422 => ChromaSubsampling::Yuv422,
            SubsamplingArg::Yuv420 => ChromaSubsampling::Yuv420,
        }
    }
}

/// Convert HEIC/HEIF files to JPEG in place
#[derive(Parser)]
#[command(name = "heic2jpg")]
#[command(author, version, about = ABOUT, long_about = None)]
struct Cli {
    /// Files or directories to convert
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Parallel workers (default: available parallelism)
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// JPEG quality
    #[arg(short = 'q', long, default_value_t = heic2jpg::config::DEFAULT_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Replace existing JPEG files instead of skipping their sources
    #[arg(long)]
    overwrite: bool,

    /// Color profile handling
    #[arg(long, value_enum, default_value = "convert-to-standard")]
    icc: IccArg,

    /// Chroma subsampling
    #[arg(long, value_enum, default_value = "420")]
    subsampling: SubsamplingArg,

    /// Do not ask for confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Print the summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Write JSON-lines progress to stderr
    #[arg(long)]
    progress: bool,
}

fn confirm(count: usize) -> bool {
    print!(
        "{} file(s) will be converted and the originals deleted. Proceed with conversion? [y/N] ",
        count
    );
    std::io::stdout().flush().ok();

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Could not serialize summary: {}", e),
        }
        return;
    }

    let stats = &summary.stats;
    println!("Conversion finished:");
    println!("  Converted: {}", stats.converted);
    println!("  Skipped: {}", stats.skipped);
    println!("  Failed: {}", stats.failed);
    if stats.not_attempted > 0 {
        println!("  Not attempted: {}", stats.not_attempted);
    }
    println!("  Duration: {}ms", summary.duration_ms);
    for failure in &stats.failures {
        println!("  FAILED {}: {}", failure.path.display(), failure.message);
    }
    for warning in &stats.warnings {
        println!("  WARNING {}: {}", warning.path.display(), warning.message);
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = RunConfig::builder()
        .roots(cli.paths)
        .num_workers(cli.workers.unwrap_or(0))
        .quality(cli.quality)
        .overwrite(cli.overwrite)
        .color_mode(cli.icc.into())
        .subsampling(cli.subsampling.into())
        .build();

    let found = match pipeline::discover(&config) {
        Ok(found) => found,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if found.items.is_empty() {
        println!("No files found");
        std::process::exit(0);
    }

    if !cli.yes && !confirm(found.items.len()) {
        println!("Aborted");
        std::process::exit(0);
    }

    // Installed only now so Ctrl-C at the prompt still terminates the process
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if !handler_token.is_cancelled() {
            eprintln!("Interrupted, finishing conversions in progress...");
            handler_token.cancel();
        }
    }) {
        error!("Could not install interrupt handler: {}", e);
    }

    let reporter = ProgressReporter::new(cli.progress, PROGRESS_INTERVAL_MS);
    let codec = Arc::new(StandardCodec::new());

    let result = pipeline::convert(&config, found.items, codec, cancel, &reporter);
    match result {
        Ok(mut summary) => {
            summary.discovery_errors = found.errors;
            print_summary(&summary, cli.json);
            if summary.cancelled {
                info!("Run was cancelled");
            }
            std::process::exit(summary.exit_code());
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
