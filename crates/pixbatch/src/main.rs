//! pixbatch CLI - In-place batch transforms over directories of images.
//!
//! Every batch command rewrites the images of one flat directory. Outputs are
//! normalized to PNG and only replace the originals once fully written.
//!
//! # Usage
//!
//! ```bash
//! # Work on a copy, then shrink and gray-scale it
//! pixbatch dup ./photos ./work
//! pixbatch preprocess ./work
//!
//! # Degrade with reproducible noise, then compare against the clean copy
//! pixbatch noise ./work --sigma 25 --seed 1
//! pixbatch compare ./strips ./photos ./work
//!
//! # View configuration
//! pixbatch config show
//! ```

use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod cli;
mod logging;

/// pixbatch - In-place batch transforms over directories of images.
#[derive(Parser, Debug)]
#[command(name = "pixbatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// No progress bar or summary; only warnings and errors are logged
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Abort a batch at the first file that fails
    #[arg(long, global = true)]
    strict: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "PIXBATCH_CONFIG")]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert every image to RGB (or grayscale with --gray)
    Normalize(cli::batch::NormalizeArgs),

    /// Shrink images larger than the given bounds
    Resize(cli::batch::ResizeArgs),

    /// Normalize, convert to grayscale and shrink in one pass
    Preprocess(cli::batch::PreprocessArgs),

    /// Apply median, Gaussian and/or mean blurs
    Filter(cli::batch::FilterArgs),

    /// Rotate by 90 degrees counter-clockwise (270 with --reverse)
    Rotate(cli::batch::RotateArgs),

    /// Replace every image with its red, green and blue components
    Split(cli::batch::DirArgs),

    /// Recombine `<stem>_red/_green/_blue.png` into `<stem>.png`
    Merge(cli::batch::DirArgs),

    /// Add Gaussian noise
    Noise(cli::batch::NoiseArgs),

    /// Weighted average of several images into one file
    Average(cli::compose::AverageArgs),

    /// Build side-by-side strips of same-named images from several directories
    Compare(cli::compose::CompareArgs),

    /// Build one strip from the first images of a directory
    Sheet(cli::compose::SheetArgs),

    /// Replace a directory with a copy of another
    Dup(cli::workdir::DupArgs),

    /// Create an empty directory, deleting any existing one
    Init(cli::workdir::InitArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e:#}\n  \
                 Using default configuration. Check your config file with `pixbatch config path`."
            );
            pixbatch_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.quiet, cli.json_logs);

    tracing::debug!("pixbatch v{}", pixbatch_core::VERSION);

    let ctx = cli::Context::new(config, cli.strict, cli.quiet, cli.config);

    // Dispatch to the appropriate command handler
    let outcome = match cli.command {
        Commands::Normalize(args) => cli::batch::normalize(&ctx, args),
        Commands::Resize(args) => cli::batch::resize(&ctx, args),
        Commands::Preprocess(args) => cli::batch::preprocess(&ctx, args),
        Commands::Filter(args) => cli::batch::filter(&ctx, args),
        Commands::Rotate(args) => cli::batch::rotate(&ctx, args),
        Commands::Split(args) => cli::batch::split(&ctx, args),
        Commands::Merge(args) => cli::batch::merge(&ctx, args),
        Commands::Noise(args) => cli::batch::noise(&ctx, args),
        Commands::Average(args) => cli::compose::average(&ctx, args),
        Commands::Compare(args) => cli::compose::compare(&ctx, args),
        Commands::Sheet(args) => cli::compose::sheet(&ctx, args),
        Commands::Dup(args) => cli::workdir::dup(args),
        Commands::Init(args) => cli::workdir::init(args),
        Commands::Config(args) => cli::config::execute(&ctx, args),
    };

    match outcome {
        Ok(cli::Outcome::Clean) => ExitCode::SUCCESS,
        Ok(cli::Outcome::Failures(n)) => {
            tracing::warn!("{} file(s) failed", n);
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
