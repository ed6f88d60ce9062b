//! Batch orchestration: discover, plan, then process items one at a time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info_span, trace, warn};

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::decode::format_to_string;
use crate::pipeline::{FileDiscovery, ImageDecoder, ImageRef, RasterWriter, StagedFile};

use super::{BatchObserver, BatchResult, BatchTransform, WorkItem};

/// Options for controlling batch behavior.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Stop at the first failed item and return its error
    pub strict: bool,
}

/// Applies a [`BatchTransform`] to every image in a directory, in place.
#[derive(Debug, Clone)]
pub struct BatchTransformer {
    decoder: ImageDecoder,
    discovery: FileDiscovery,
    options: BatchOptions,
}

impl BatchTransformer {
    /// Create a transformer from the loaded configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            discovery: FileDiscovery::new(config.processing.clone()),
            options: BatchOptions {
                strict: config.batch.strict,
            },
        }
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn decoder(&self) -> &ImageDecoder {
        &self.decoder
    }

    /// Supported images directly inside `dir`, sorted.
    pub fn discover(&self, dir: &Path) -> Vec<ImageRef> {
        self.discovery.discover(dir)
    }

    /// Run `transform` over every supported image in `dir`.
    ///
    /// Per-item failures are recorded in the returned [`BatchResult`] and
    /// leave that item's inputs untouched. In strict mode the first failure
    /// is returned instead. Invalid transform parameters are returned before
    /// any file is read. Items whose outputs collide with another item's
    /// files fail without touching the disk.
    pub fn run(
        &self,
        dir: &Path,
        transform: &dyn BatchTransform,
        observer: &mut dyn BatchObserver,
    ) -> PipelineResult<BatchResult> {
        let span = info_span!("batch", transform = transform.name(), dir = %dir.display());
        let _enter = span.enter();

        if !dir.is_dir() {
            return Err(PipelineError::NotADirectory(dir.to_path_buf()));
        }
        transform.validate()?;

        let start = Instant::now();
        let files = self.discover(dir);
        let items = transform.plan(&files);
        let mut collisions = find_collisions(&items, &files);
        debug!(
            files = files.len(),
            bytes = FileDiscovery::total_size(&files),
            items = items.len(),
            collisions = collisions.len(),
            "Planned {}",
            transform.describe()
        );
        observer.started(transform.name(), items.len());

        let mut result = BatchResult::default();
        for (index, item) in items.iter().enumerate() {
            observer.item_started(index, item);
            let outcome = match collisions.remove(&index) {
                Some((path, other)) => Err(PipelineError::OutputCollision { path, other }),
                None => self.process_item(item, transform),
            };
            match outcome {
                Ok(outputs) => {
                    observer.item_succeeded(item, &outputs);
                    result.record_success(outputs);
                }
                Err(e) => {
                    observer.item_failed(item, &e);
                    result.record_failure(item.path(), &e);
                    if self.options.strict {
                        result.elapsed = start.elapsed();
                        observer.finished(&result);
                        return Err(e);
                    }
                }
            }
        }

        result.elapsed = start.elapsed();
        observer.finished(&result);
        Ok(result)
    }

    /// Decode, render, stage, commit, then drop consumed inputs.
    fn process_item(
        &self,
        item: &WorkItem,
        transform: &dyn BatchTransform,
    ) -> PipelineResult<Vec<PathBuf>> {
        let start = Instant::now();

        // Multi-input plans name siblings that may not exist.
        if let Some(missing) = item.inputs.iter().find(|p| !p.is_file()) {
            return Err(PipelineError::MissingComponent(missing.clone()));
        }

        let rasters = item
            .inputs
            .iter()
            .map(|path| {
                let decoded = self.decoder.decode(path)?;
                trace!(
                    format = %format_to_string(decoded.format),
                    bytes = decoded.file_size,
                    "  Decoded {:?}",
                    path
                );
                Ok(decoded.raster)
            })
            .collect::<PipelineResult<Vec<_>>>()?;
        trace!("  Decode: {:?}", start.elapsed());

        let rendered = transform.render(rasters)?;
        if rendered.len() != item.outputs.len() {
            return Err(PipelineError::invalid(
                transform.name(),
                format!(
                    "rendered {} image(s) for {} output path(s)",
                    rendered.len(),
                    item.outputs.len()
                ),
            ));
        }
        trace!("  Render: {:?}", start.elapsed());

        // Nothing is replaced until every output has encoded successfully.
        let staged = rendered
            .iter()
            .zip(&item.outputs)
            .map(|(raster, target)| RasterWriter::stage(raster, target))
            .collect::<PipelineResult<Vec<StagedFile>>>()?;

        let mut outputs = Vec::with_capacity(staged.len());
        for file in staged {
            match file.commit() {
                Ok(path) => outputs.push(path),
                Err(e) => {
                    discard_committed(&outputs, &item.inputs);
                    return Err(e);
                }
            }
        }
        trace!("  Write: {:?}", start.elapsed());

        for input in item.inputs.iter().filter(|i| !outputs.contains(i)) {
            std::fs::remove_file(input).map_err(|e| PipelineError::io(input, e))?;
        }

        debug!("Processed {:?} in {:?}", item.path(), start.elapsed());
        Ok(outputs)
    }
}

/// Items with an output that another item also reads or writes, or that
/// would overwrite a discovered file the item does not consume.
///
/// Maps each such item's index to the contested path and the other file.
fn find_collisions(items: &[WorkItem], files: &[ImageRef]) -> HashMap<usize, (PathBuf, PathBuf)> {
    let mut claims: HashMap<&Path, Vec<usize>> = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        for path in item.inputs.iter().chain(&item.outputs) {
            let owners = claims.entry(path.as_path()).or_default();
            if owners.last() != Some(&index) {
                owners.push(index);
            }
        }
    }

    let mut collisions = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        for output in &item.outputs {
            let other_item = claims
                .get(output.as_path())
                .and_then(|owners| owners.iter().find(|&&o| o != index));
            let other = match other_item {
                Some(&o) => Some(items[o].path().to_path_buf()),
                None if !item.inputs.contains(output)
                    && files.iter().any(|f| &f.path == output) =>
                {
                    Some(output.clone())
                }
                None => None,
            };
            if let Some(other) = other {
                collisions.insert(index, (output.clone(), other));
                break;
            }
        }
    }
    collisions
}

/// Undo a partially committed item. Outputs that replaced one of the item's
/// inputs cannot be restored and are left in place.
fn discard_committed(committed: &[PathBuf], inputs: &[PathBuf]) {
    for path in committed.iter().filter(|p| !inputs.contains(p)) {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Cannot remove partial output {:?}: {}", path, e);
        }
    }
}
