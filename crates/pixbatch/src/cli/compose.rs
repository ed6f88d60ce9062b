//! Commands that combine several images: average, compare and sheet.

use anyhow::Context as _;
use clap::Args;
use pixbatch_core::compose::DEFAULT_SHEET_LIMIT;
use pixbatch_core::transform::average_files;
use pixbatch_core::{
    compare_folders, contact_sheet, workdir, BatchObserver, ColorSpace, ConcatOptions, LabelColor,
    RasterWriter, SilentObserver,
};
use std::path::PathBuf;

use super::progress::{conclude, ProgressObserver, ResultCapture};
use super::{expand_path, Context, Outcome};

/// Arguments for the `average` command.
#[derive(Args, Debug)]
pub struct AverageArgs {
    /// Output image file
    pub output: PathBuf,

    /// Images to average (all the same size)
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Comma-separated weights, one per input (default: equal)
    #[arg(long, value_delimiter = ',')]
    pub weights: Option<Vec<f64>>,
}

/// Layout flags shared by `compare` and `sheet`.
#[derive(Args, Debug, Clone)]
pub struct StripArgs {
    /// Build grayscale strips
    #[arg(long)]
    pub gray: bool,

    /// Force every image to this height (aspect ratio kept)
    #[arg(long)]
    pub height: Option<u32>,

    /// Force every image to this width (aspect ratio kept unless --height is set)
    #[arg(long)]
    pub width: Option<u32>,

    /// Keep original heights instead of scaling to the smallest
    #[arg(long)]
    pub keep_heights: bool,

    /// Do not draw labels even if a font is configured
    #[arg(long)]
    pub no_labels: bool,

    /// Label color as R,G,B (default: light steel blue)
    #[arg(long, value_name = "R,G,B", value_parser = parse_rgb)]
    pub label_color: Option<[u8; 3]>,
}

/// Arguments for the `compare` command.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Directory receiving one `<stem>.png` strip per image
    pub out_dir: PathBuf,

    /// Directories to compare; file names come from the first one
    #[arg(required_unless_present = "parent", num_args = 1..)]
    pub dirs: Vec<PathBuf>,

    /// Compare every subdirectory of this directory instead, in name order
    #[arg(long, conflicts_with = "dirs")]
    pub parent: Option<PathBuf>,

    #[command(flatten)]
    pub strip: StripArgs,

    /// Write the batch result as JSON to this file
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

/// Arguments for the `sheet` command.
#[derive(Args, Debug)]
pub struct SheetArgs {
    /// Directory to sample
    pub dir: PathBuf,

    /// Output image file
    pub output: PathBuf,

    /// Number of images to include
    #[arg(long, default_value_t = DEFAULT_SHEET_LIMIT)]
    pub limit: usize,

    #[command(flatten)]
    pub strip: StripArgs,
}

pub fn average(ctx: &Context, args: AverageArgs) -> anyhow::Result<Outcome> {
    let inputs: Vec<PathBuf> = args.inputs.iter().map(|p| expand_path(p)).collect();
    let output = expand_path(&args.output);
    let transformer = ctx.transformer();

    let written = average_files(
        transformer.decoder(),
        &inputs,
        args.weights.as_deref(),
        &output,
    )
    .with_context(|| format!("Cannot average {} image(s)", inputs.len()))?;

    tracing::info!("Averaged {} image(s) into {:?}", inputs.len(), written);
    Ok(Outcome::Clean)
}

pub fn compare(ctx: &Context, args: CompareArgs) -> anyhow::Result<Outcome> {
    let out_dir = expand_path(&args.out_dir);
    let dirs = compare_dirs(&args, &out_dir)?;
    let labeler = strip_labeler(ctx, &args.strip)?;
    let options = strip_options(&args.strip, ctx.config.labels.compare_size);

    let mut silent = SilentObserver;
    let mut progress = ProgressObserver::new();
    let observer: &mut dyn BatchObserver = if ctx.quiet {
        &mut silent
    } else {
        &mut progress
    };
    let mut capture = ResultCapture::new(observer);
    let run = compare_folders(
        &ctx.transformer(),
        &dirs,
        &out_dir,
        &options,
        labeler.as_deref(),
        &mut capture,
    )
    .with_context(|| format!("Cannot compare {} director(ies)", dirs.len()));

    let report = args.report.as_deref().map(expand_path);
    let result = conclude(run, capture.result, ctx.quiet, report.as_deref())?;
    Ok(Outcome::from_failures(result.failed()))
}

pub fn sheet(ctx: &Context, args: SheetArgs) -> anyhow::Result<Outcome> {
    let dir = expand_path(&args.dir);
    let output = expand_path(&args.output);
    let labeler = strip_labeler(ctx, &args.strip)?;
    let options = strip_options(&args.strip, ctx.config.labels.compare_size);

    let sheet = contact_sheet(
        &ctx.transformer(),
        &dir,
        args.limit,
        &options,
        labeler.as_deref(),
    )
    .with_context(|| format!("Cannot build a contact sheet from {}", dir.display()))?;
    RasterWriter::write(&sheet, &output)?;

    tracing::info!("Contact sheet written to {:?}", output);
    Ok(Outcome::Clean)
}

/// Explicit directories, or the subdirectories of `--parent` minus `out_dir`.
fn compare_dirs(args: &CompareArgs, out_dir: &std::path::Path) -> anyhow::Result<Vec<PathBuf>> {
    let Some(parent) = &args.parent else {
        return Ok(args.dirs.iter().map(|p| expand_path(p)).collect());
    };
    let parent = expand_path(parent);
    let dirs: Vec<PathBuf> = workdir::subdirectories(&parent)
        .with_context(|| format!("Cannot list {}", parent.display()))?
        .into_iter()
        .filter(|d| d != out_dir)
        .collect();
    if dirs.is_empty() {
        anyhow::bail!("No subdirectories to compare in {}", parent.display());
    }
    Ok(dirs)
}

fn strip_options(args: &StripArgs, label_size: f32) -> ConcatOptions {
    let defaults = ConcatOptions::default();
    ConcatOptions {
        color_space: if args.gray {
            ColorSpace::Luma
        } else {
            ColorSpace::Rgb
        },
        same_height: !args.keep_heights,
        width: args.width,
        height: args.height,
        label_size,
        label_color: args
            .label_color
            .map(LabelColor::from_rgb)
            .unwrap_or(defaults.label_color),
        ..defaults
    }
}

fn parse_rgb(s: &str) -> Result<[u8; 3], String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid color '{s}': {e}"))?;
    parts
        .try_into()
        .map_err(|_| format!("expected R,G,B, got '{s}'"))
}

fn strip_labeler(
    ctx: &Context,
    args: &StripArgs,
) -> anyhow::Result<Option<std::sync::Arc<pixbatch_core::Labeler>>> {
    if args.no_labels {
        return Ok(None);
    }
    let labeler = ctx.labeler()?;
    if labeler.is_none() {
        tracing::debug!("No label font configured; strips are unlabelled");
    }
    Ok(labeler)
}
