//! Batch outcome bookkeeping.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ErrorKind, PipelineError};

/// One file that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

impl FileFailure {
    pub fn new(path: impl Into<PathBuf>, error: &PipelineError) -> Self {
        Self {
            path: path.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Outcome of one batch run.
///
/// `attempted == succeeded + failures.len()` always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Work items started
    pub attempted: usize,
    /// Work items whose outputs were all written
    pub succeeded: usize,
    /// Work items that failed, in processing order
    pub failures: Vec<FileFailure>,
    /// Every output written
    pub outputs: Vec<PathBuf>,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl BatchResult {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// True when every attempted item succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Items per second, zero for an empty or instantaneous run.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.attempted as f64 / secs
        } else {
            0.0
        }
    }

    pub fn record_success(&mut self, outputs: impl IntoIterator<Item = PathBuf>) {
        self.attempted += 1;
        self.succeeded += 1;
        self.outputs.extend(outputs);
    }

    pub fn record_failure(&mut self, path: impl Into<PathBuf>, error: &PipelineError) {
        self.attempted += 1;
        self.failures.push(FileFailure::new(path, error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_stay_consistent() {
        let mut result = BatchResult::default();
        assert!(result.is_clean());

        result.record_success([PathBuf::from("a.png")]);
        result.record_failure(
            "b.png",
            &PipelineError::MissingComponent(PathBuf::from("b_green.png")),
        );

        assert_eq!(result.attempted, 2);
        assert_eq!(result.attempted, result.succeeded + result.failed());
        assert!(!result.is_clean());
        assert_eq!(result.failures[0].kind, ErrorKind::MissingComponent);
        assert!(result.failures[0].message.contains("b_green.png"));
    }

    #[test]
    fn test_report_serializes() {
        let mut result = BatchResult::default();
        result.record_failure(
            "x.png",
            &PipelineError::invalid("median_blur", "kernel size must be odd"),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["attempted"], 1);
        assert_eq!(json["failures"][0]["kind"], "transform");
    }

    #[test]
    fn test_throughput() {
        let result = BatchResult {
            attempted: 10,
            succeeded: 10,
            elapsed: Duration::from_secs(2),
            ..BatchResult::default()
        };
        assert!((result.throughput() - 5.0).abs() < f64::EPSILON);
        assert_eq!(BatchResult::default().throughput(), 0.0);
    }
}
