//! Progress callbacks for batch runs.

use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::{BatchResult, WorkItem};
use crate::error::PipelineError;

/// Receives progress from [`BatchTransformer::run`](super::BatchTransformer::run).
///
/// Every method has an empty default, so observers implement only what they need.
pub trait BatchObserver {
    /// Called once the work items are planned.
    fn started(&mut self, _transform: &str, _total: usize) {}

    fn item_started(&mut self, _index: usize, _item: &WorkItem) {}

    fn item_succeeded(&mut self, _item: &WorkItem, _outputs: &[PathBuf]) {}

    fn item_failed(&mut self, _item: &WorkItem, _error: &PipelineError) {}

    fn finished(&mut self, _result: &BatchResult) {}
}

/// Ignores all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl BatchObserver for SilentObserver {}

/// Emits structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl BatchObserver for TracingObserver {
    fn started(&mut self, transform: &str, total: usize) {
        info!(transform, total, "Batch started");
    }

    fn item_succeeded(&mut self, item: &WorkItem, outputs: &[PathBuf]) {
        debug!(
            path = %item.path().display(),
            outputs = outputs.len(),
            "Processed"
        );
    }

    fn item_failed(&mut self, item: &WorkItem, error: &PipelineError) {
        warn!(path = %item.path().display(), kind = ?error.kind(), "Failed: {}", error);
    }

    fn finished(&mut self, result: &BatchResult) {
        info!(
            attempted = result.attempted,
            succeeded = result.succeeded,
            failed = result.failed(),
            elapsed_ms = result.elapsed.as_millis() as u64,
            "Batch finished"
        );
    }
}
