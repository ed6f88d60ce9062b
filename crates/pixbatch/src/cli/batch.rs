//! In-place batch commands: normalize, resize, preprocess, filter, rotate,
//! split, merge and noise.

use anyhow::Context as _;
use clap::Args;
use pixbatch_core::config::Config;
use pixbatch_core::transform::NoiseLabel;
use pixbatch_core::{
    AddNoise, BatchObserver, BatchTransform, Chain, GaussianBlur, MeanBlur, MedianBlur,
    MergeChannels, Normalize, PerFile, Quarter, ResizeIfLarger, Rotate, SilentObserver,
    SplitChannels,
};
use std::path::PathBuf;

use super::progress::{conclude, ProgressObserver, ResultCapture};
use super::{expand_path, Context, Outcome};

/// Target directory shared by every batch command.
#[derive(Args, Debug, Clone)]
pub struct DirArgs {
    /// Directory whose images are rewritten in place
    pub dir: PathBuf,

    /// Write the batch result as JSON to this file
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

/// Arguments for the `normalize` command.
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub target: DirArgs,

    /// Convert to grayscale instead of RGB
    #[arg(long)]
    pub gray: bool,
}

/// Arguments for the `resize` command.
#[derive(Args, Debug)]
pub struct ResizeArgs {
    #[command(flatten)]
    pub target: DirArgs,

    /// Maximum width (defaults to resize.max_width)
    #[arg(long)]
    pub max_width: Option<u32>,

    /// Maximum height (defaults to resize.max_height)
    #[arg(long)]
    pub max_height: Option<u32>,
}

/// Arguments for the `preprocess` command.
#[derive(Args, Debug)]
pub struct PreprocessArgs {
    #[command(flatten)]
    pub target: DirArgs,

    /// Keep color instead of converting to grayscale
    #[arg(long)]
    pub no_gray: bool,

    /// Skip the resize-if-larger step
    #[arg(long)]
    pub no_resize: bool,

    /// Maximum width (defaults to resize.max_width)
    #[arg(long)]
    pub max_width: Option<u32>,

    /// Maximum height (defaults to resize.max_height)
    #[arg(long)]
    pub max_height: Option<u32>,
}

/// Arguments for the `filter` command.
///
/// Each filter flag takes an optional kernel size; without a value the
/// `[filter]` config default is used. Filters run median, Gaussian, mean.
#[derive(Args, Debug)]
pub struct FilterArgs {
    #[command(flatten)]
    pub target: DirArgs,

    /// Median blur with an odd kernel size
    #[arg(long, value_name = "K", num_args = 0..=1)]
    pub median: Option<Option<u32>>,

    /// Gaussian blur with kernel `K` or `KXxKY`
    #[arg(long, value_name = "KXxKY", num_args = 0..=1, value_parser = parse_kernel_pair)]
    pub gaussian: Option<Option<(u32, u32)>>,

    /// Gaussian sigma; 0 derives it from the kernel size
    #[arg(long, requires = "gaussian")]
    pub sigma: Option<f32>,

    /// Mean (box) blur with an odd kernel size
    #[arg(long, value_name = "K", num_args = 0..=1)]
    pub mean: Option<Option<u32>>,
}

/// Arguments for the `rotate` command.
#[derive(Args, Debug)]
pub struct RotateArgs {
    #[command(flatten)]
    pub target: DirArgs,

    /// Rotate 270 degrees instead, undoing a previous rotate
    #[arg(long)]
    pub reverse: bool,
}

/// Arguments for the `noise` command.
#[derive(Args, Debug)]
pub struct NoiseArgs {
    #[command(flatten)]
    pub target: DirArgs,

    /// Standard deviation in 8-bit intensity units (defaults to noise.sigma)
    #[arg(long)]
    pub sigma: Option<f32>,

    /// Fixed seed for reproducible noise (defaults to noise.seed)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stamp `sigma = <sigma>` on every image (needs labels.font_path)
    #[arg(long)]
    pub label: bool,
}

pub fn normalize(ctx: &Context, args: NormalizeArgs) -> anyhow::Result<Outcome> {
    let transform = if args.gray {
        Normalize::grayscale()
    } else {
        Normalize::rgb()
    };
    run_batch(ctx, &args.target, &PerFile(transform))
}

pub fn resize(ctx: &Context, args: ResizeArgs) -> anyhow::Result<Outcome> {
    let transform = ResizeIfLarger::new(
        args.max_width.unwrap_or(ctx.config.resize.max_width),
        args.max_height.unwrap_or(ctx.config.resize.max_height),
    );
    run_batch(ctx, &args.target, &PerFile(transform))
}

pub fn preprocess(ctx: &Context, args: PreprocessArgs) -> anyhow::Result<Outcome> {
    let chain = preprocess_chain(&args, &ctx.config);
    run_batch(ctx, &args.target, &PerFile(chain))
}

pub fn filter(ctx: &Context, args: FilterArgs) -> anyhow::Result<Outcome> {
    let chain = filter_chain(&args, &ctx.config)?;
    run_batch(ctx, &args.target, &PerFile(chain))
}

pub fn rotate(ctx: &Context, args: RotateArgs) -> anyhow::Result<Outcome> {
    let quarter = if args.reverse {
        Quarter::Ccw270
    } else {
        Quarter::Ccw90
    };
    run_batch(ctx, &args.target, &PerFile(Rotate::new(quarter)))
}

pub fn split(ctx: &Context, args: DirArgs) -> anyhow::Result<Outcome> {
    run_batch(ctx, &args, &SplitChannels)
}

pub fn merge(ctx: &Context, args: DirArgs) -> anyhow::Result<Outcome> {
    run_batch(ctx, &args, &MergeChannels)
}

pub fn noise(ctx: &Context, args: NoiseArgs) -> anyhow::Result<Outcome> {
    let mut transform = AddNoise::new(args.sigma.unwrap_or(ctx.config.noise.sigma));
    transform.seed = args.seed.or(ctx.config.noise.seed);
    if args.label {
        let labeler = ctx.labeler()?.ok_or_else(|| {
            anyhow::anyhow!(pixbatch_core::label::missing_font("add_noise"))
        })?;
        transform.label = Some(NoiseLabel {
            labeler,
            size: ctx.config.labels.noise_size,
        });
    }
    run_batch(ctx, &args.target, &PerFile(transform))
}

/// RGB normalization, then optional grayscale, then optional resize.
fn preprocess_chain(args: &PreprocessArgs, config: &Config) -> Chain {
    let mut chain = Chain::new().then(Normalize::rgb());
    if !args.no_gray {
        chain = chain.then(Normalize::grayscale());
    }
    if !args.no_resize {
        chain = chain.then(ResizeIfLarger::new(
            args.max_width.unwrap_or(config.resize.max_width),
            args.max_height.unwrap_or(config.resize.max_height),
        ));
    }
    chain
}

fn filter_chain(args: &FilterArgs, config: &Config) -> anyhow::Result<Chain> {
    let defaults = &config.filter;
    let mut chain = Chain::new();
    if let Some(kernel) = args.median {
        chain = chain.then(MedianBlur::new(kernel.unwrap_or(defaults.median_kernel)));
    }
    if let Some(kernels) = args.gaussian {
        let (kx, ky) =
            kernels.unwrap_or((defaults.gaussian_kernel_x, defaults.gaussian_kernel_y));
        let sigma = args.sigma.unwrap_or(defaults.gaussian_sigma);
        chain = chain.then(GaussianBlur::new(kx, ky, sigma));
    }
    if let Some(kernel) = args.mean {
        chain = chain.then(MeanBlur::new(kernel.unwrap_or(defaults.mean_kernel)));
    }
    if chain.is_empty() {
        anyhow::bail!("No filter selected.\n\n  Hint: pass --median, --gaussian and/or --mean.");
    }
    Ok(chain)
}

/// Parse `K` (square) or `KXxKY`.
fn parse_kernel_pair(s: &str) -> Result<(u32, u32), String> {
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid kernel size {v:?}: {e}"))
    };
    match s.split_once(['x', 'X']) {
        Some((kx, ky)) => Ok((parse(kx)?, parse(ky)?)),
        None => {
            let k = parse(s)?;
            Ok((k, k))
        }
    }
}

/// Run one batch with progress, summary and optional JSON report.
fn run_batch(
    ctx: &Context,
    args: &DirArgs,
    transform: &dyn BatchTransform,
) -> anyhow::Result<Outcome> {
    let dir = expand_path(&args.dir);
    let transformer = ctx.transformer();
    tracing::info!("{} on {}", transform.describe(), dir.display());

    let mut silent = SilentObserver;
    let mut progress = ProgressObserver::new();
    let observer: &mut dyn BatchObserver = if ctx.quiet {
        &mut silent
    } else {
        &mut progress
    };
    let mut capture = ResultCapture::new(observer);
    let run = transformer
        .run(&dir, transform, &mut capture)
        .with_context(|| format!("{} failed on {}", transform.name(), dir.display()));

    let report = args.report.as_deref().map(expand_path);
    let result = conclude(run, capture.result, ctx.quiet, report.as_deref())?;
    if result.attempted == 0 {
        tracing::warn!("No supported image files found in {:?}", dir);
    }
    Ok(Outcome::from_failures(result.failed()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixbatch_core::Transform;

    fn dir_args() -> DirArgs {
        DirArgs {
            dir: PathBuf::from("."),
            report: None,
        }
    }

    #[test]
    fn test_parse_kernel_pair() {
        assert_eq!(parse_kernel_pair("5"), Ok((5, 5)));
        assert_eq!(parse_kernel_pair("5x3"), Ok((5, 3)));
        assert_eq!(parse_kernel_pair("7X1"), Ok((7, 1)));
        assert!(parse_kernel_pair("5x").is_err());
        assert!(parse_kernel_pair("big").is_err());
    }

    #[test]
    fn test_filter_chain_order_and_defaults() {
        let args = FilterArgs {
            target: dir_args(),
            median: Some(None),
            gaussian: Some(Some((3, 5))),
            sigma: Some(1.5),
            mean: Some(Some(7)),
        };
        let chain = filter_chain(&args, &Config::default()).unwrap();
        assert_eq!(
            chain.describe(),
            "median(5) -> gaussian(3x5, sigma=1.5) -> mean(7)"
        );
    }

    #[test]
    fn test_filter_chain_requires_a_filter() {
        let args = FilterArgs {
            target: dir_args(),
            median: None,
            gaussian: None,
            sigma: None,
            mean: None,
        };
        assert!(filter_chain(&args, &Config::default()).is_err());
    }

    #[test]
    fn test_preprocess_chain() {
        let args = PreprocessArgs {
            target: dir_args(),
            no_gray: false,
            no_resize: false,
            max_width: Some(640),
            max_height: None,
        };
        let chain = preprocess_chain(&args, &Config::default());
        assert_eq!(
            chain.describe(),
            "normalize(rgb) -> normalize(luma) -> resize(<= 640x1000)"
        );

        let args = PreprocessArgs {
            no_gray: true,
            no_resize: true,
            ..args
        };
        assert_eq!(preprocess_chain(&args, &Config::default()).len(), 1);
    }
}
