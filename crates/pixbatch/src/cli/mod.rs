//! Command implementations and shared CLI plumbing.

pub mod batch;
pub mod compose;
pub mod config;
pub mod progress;
pub mod workdir;

use anyhow::Context as _;
use pixbatch_core::{BatchOptions, BatchTransformer, Config, Labeler};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How a command finished when it did not error outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    /// Some files failed; the count is reported and the exit code is non-zero
    Failures(usize),
}

impl Outcome {
    pub fn from_failures(failed: usize) -> Self {
        if failed == 0 {
            Outcome::Clean
        } else {
            Outcome::Failures(failed)
        }
    }
}

/// Settings shared by every command.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub quiet: bool,
    /// Path given with `--config`, if any
    pub config_path: Option<PathBuf>,
}

impl Context {
    pub fn new(mut config: Config, strict: bool, quiet: bool, config_path: Option<PathBuf>) -> Self {
        if strict {
            config.batch.strict = true;
        }
        Self {
            config,
            quiet,
            config_path,
        }
    }

    pub fn transformer(&self) -> BatchTransformer {
        BatchTransformer::new(&self.config).with_options(BatchOptions {
            strict: self.config.batch.strict,
        })
    }

    /// The configured label font, loaded on demand.
    pub fn labeler(&self) -> anyhow::Result<Option<Arc<Labeler>>> {
        let Some(path) = self.config.font_path() else {
            return Ok(None);
        };
        let labeler = Labeler::from_file(&path)
            .with_context(|| format!("Cannot load label font {}", path.display()))?;
        Ok(Some(Arc::new(labeler)))
    }
}

/// Load `--config` if given, else the default config file.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            let path = expand_path(path);
            Config::load_from(&path)
                .with_context(|| format!("Cannot load config file {}", path.display()))
        }
        None => Ok(Config::load()?),
    }
}

/// Expand a leading `~` in a user-supplied path.
pub fn expand_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}
