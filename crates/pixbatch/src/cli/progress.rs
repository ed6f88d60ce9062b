//! Terminal progress and end-of-run reporting for batch commands.

use indicatif::{ProgressBar, ProgressStyle};
use pixbatch_core::{BatchObserver, BatchResult, PipelineError, TracingObserver, WorkItem};
use std::path::{Path, PathBuf};

/// Drives an `indicatif` bar and forwards events to [`TracingObserver`].
pub struct ProgressObserver {
    bar: ProgressBar,
    log: TracingObserver,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            log: TracingObserver,
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchObserver for ProgressObserver {
    fn started(&mut self, transform: &str, total: usize) {
        self.bar = create_progress_bar(total as u64);
        self.bar.set_prefix(transform.to_string());
        self.log.started(transform, total);
    }

    fn item_started(&mut self, _index: usize, item: &WorkItem) {
        let name = item
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.set_message(name);
    }

    fn item_succeeded(&mut self, item: &WorkItem, outputs: &[PathBuf]) {
        self.bar.inc(1);
        self.log.item_succeeded(item, outputs);
    }

    fn item_failed(&mut self, item: &WorkItem, error: &PipelineError) {
        self.bar.inc(1);
        self.bar.suspend(|| self.log.item_failed(item, error));
    }

    fn finished(&mut self, result: &BatchResult) {
        self.bar.finish_and_clear();
        self.log.finished(result);
    }
}

/// Forwards every event and keeps the final [`BatchResult`], including the
/// partial one a strict run reports before returning its error.
pub struct ResultCapture<'a> {
    inner: &'a mut dyn BatchObserver,
    pub result: Option<BatchResult>,
}

impl<'a> ResultCapture<'a> {
    pub fn new(inner: &'a mut dyn BatchObserver) -> Self {
        Self {
            inner,
            result: None,
        }
    }
}

impl BatchObserver for ResultCapture<'_> {
    fn started(&mut self, transform: &str, total: usize) {
        self.inner.started(transform, total);
    }

    fn item_started(&mut self, index: usize, item: &WorkItem) {
        self.inner.item_started(index, item);
    }

    fn item_succeeded(&mut self, item: &WorkItem, outputs: &[PathBuf]) {
        self.inner.item_succeeded(item, outputs);
    }

    fn item_failed(&mut self, item: &WorkItem, error: &PipelineError) {
        self.inner.item_failed(item, error);
    }

    fn finished(&mut self, result: &BatchResult) {
        self.result = Some(result.clone());
        self.inner.finished(result);
    }
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    match ProgressStyle::default_bar().template(
        "{spinner:.green} {prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        Ok(style) => pb.set_style(style.progress_chars("##-")),
        Err(e) => tracing::debug!("Progress template rejected: {}", e),
    }
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after a batch.
pub fn print_summary(result: &BatchResult) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", result.succeeded);
    if result.failed() > 0 {
        eprintln!("    Failed:       {:>8}", result.failed());
    }
    eprintln!("    Outputs:      {:>8}", result.outputs.len());
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", result.attempted);
    eprintln!("    Duration:     {:>7.1}s", result.elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", result.throughput());
    eprintln!("  ====================================");
    for failure in &result.failures {
        eprintln!("    {} ({:?}): {}", failure.path.display(), failure.kind, failure.message);
    }
}

/// Write the batch result as pretty JSON.
pub fn write_report(result: &BatchResult, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json)?;
    tracing::info!("Report written to {:?}", path);
    Ok(())
}

/// Print the summary and write the optional report for a finished run.
///
/// When a strict run aborts, the partial result captured by its observer is
/// still summarized and reported before the error is returned.
pub fn conclude(
    run: anyhow::Result<BatchResult>,
    partial: Option<BatchResult>,
    quiet: bool,
    report: Option<&Path>,
) -> anyhow::Result<BatchResult> {
    let result = match run {
        Ok(result) => result,
        Err(e) => {
            if let Some(partial) = partial {
                if !quiet {
                    print_summary(&partial);
                }
                if let Some(path) = report {
                    if let Err(report_err) = write_report(&partial, path) {
                        tracing::warn!("Cannot write report: {:#}", report_err);
                    }
                }
            }
            return Err(e);
        }
    };
    if !quiet {
        print_summary(&result);
    }
    if let Some(path) = report {
        write_report(&result, path)?;
    }
    Ok(result)
}
