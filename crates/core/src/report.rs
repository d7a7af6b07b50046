//! Batch job and report types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One unit of work for the batch driver: convert `input` into `output`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionJob {
    /// Path of the source presentation. Never modified.
    pub input: PathBuf,

    /// Path the converted presentation is written to.
    pub output: PathBuf,
}

impl ConversionJob {
    /// Create a new job.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// A single failed file with its error message, in processing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failure {
    /// Input path of the file that failed.
    pub path: PathBuf,

    /// Human-readable error message.
    pub error: String,
}

/// Outcome of a batch run, built incrementally by the batch driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Number of files processed.
    pub total_files: usize,

    /// Number of files converted successfully.
    pub succeeded: usize,

    /// Number of files that failed to open or write.
    pub failed: usize,

    /// Failed files in processing order.
    pub failures: Vec<Failure>,
}

impl ConversionReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successfully converted file.
    pub fn record_success(&mut self) {
        self.total_files += 1;
        self.succeeded += 1;
    }

    /// Record one failed file with its error message.
    pub fn record_failure(&mut self, path: impl Into<PathBuf>, error: impl Into<String>) {
        self.total_files += 1;
        self.failed += 1;
        self.failures.push(Failure {
            path: path.into(),
            error: error.into(),
        });
    }

    /// True when no file failed (also true for an empty batch).
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let report = ConversionReport::new();
        assert_eq!(report.total_files, 0);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 0);
        assert!(report.all_succeeded());
    }

    #[test]
    fn test_counts_accumulate() {
        let mut report = ConversionReport::new();
        report.record_success();
        report.record_failure("bad.pptx", "failed to open presentation: not a ZIP");
        report.record_success();

        assert_eq!(report.total_files, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.all_succeeded());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, PathBuf::from("bad.pptx"));
    }

    #[test]
    fn test_failures_keep_order() {
        let mut report = ConversionReport::new();
        report.record_failure("a.pptx", "first");
        report.record_failure("b.pptx", "second");
        let order: Vec<_> = report.failures.iter().map(|f| f.error.as_str()).collect();
        assert_eq!(order, vec!["first", "second"]);
    }
}
