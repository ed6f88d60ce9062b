//! The `dup` and `init` commands for preparing working directories.

use anyhow::Context as _;
use clap::Args;
use pixbatch_core::workdir;
use std::path::PathBuf;

use super::{expand_path, Outcome};

/// Arguments for the `dup` command.
#[derive(Args, Debug)]
pub struct DupArgs {
    /// Directory to copy
    pub src: PathBuf,

    /// Destination; replaced if it exists
    pub dst: PathBuf,
}

/// Arguments for the `init` command.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to (re)create empty
    pub dir: PathBuf,
}

pub fn dup(args: DupArgs) -> anyhow::Result<Outcome> {
    let (src, dst) = (expand_path(&args.src), expand_path(&args.dst));
    workdir::duplicate_dir(&src, &dst)
        .with_context(|| format!("Cannot copy {} to {}", src.display(), dst.display()))?;
    println!("{}", dst.display());
    Ok(Outcome::Clean)
}

pub fn init(args: InitArgs) -> anyhow::Result<Outcome> {
    let dir = expand_path(&args.dir);
    workdir::init_dir(&dir).with_context(|| format!("Cannot initialize {}", dir.display()))?;
    println!("{}", dir.display());
    Ok(Outcome::Clean)
}
