//! Metrics collection for ingestion

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Metrics shared between the coordinator and the local worker
pub type SharedMetrics = Arc<Mutex<IngestionMetrics>>;

/// Apply `update` to shared metrics
///
/// A poisoned lock is recovered; counters stay usable after a panic elsewhere.
pub fn record(metrics: &SharedMetrics, update: impl FnOnce(&mut IngestionMetrics)) {
    let mut guard = metrics.lock().unwrap_or_else(PoisonError::into_inner);
    update(&mut guard);
}

/// Copy of the current counters
pub fn snapshot(metrics: &SharedMetrics) -> IngestionMetrics {
    metrics.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Cumulative counters over every batch a process has handled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionMetrics {
    /// `PrepareDocuments` calls started
    pub batches_started: usize,

    /// Batches that returned a file count
    pub batches_succeeded: usize,

    /// Batches that failed with an archive error or an escalation
    pub batches_failed: usize,

    /// Files handed to the fan-out
    pub files_dispatched: usize,

    /// Per-file domain failures degraded to soft results, by error tag
    pub soft_failures: BTreeMap<String, usize>,

    /// Uploads skipped by the payload size gate
    pub oversized_skipped: usize,

    /// Per-file retries issued after transient failures
    pub retries_issued: usize,
}

impl IngestionMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty metrics behind a shared handle
    pub fn shared() -> SharedMetrics {
        Arc::new(Mutex::new(Self::default()))
    }

    /// Record the start of a batch
    pub fn record_batch_started(&mut self) {
        self.batches_started += 1;
    }

    /// Record a batch that completed
    pub fn record_batch_succeeded(&mut self, files: usize) {
        self.batches_succeeded += 1;
        self.files_dispatched += files;
    }

    /// Record a batch that failed
    pub fn record_batch_failed(&mut self) {
        self.batches_failed += 1;
    }

    /// Record a soft per-file failure
    pub fn record_soft_failure(&mut self, tag: &str) {
        *self.soft_failures.entry(tag.to_string()).or_insert(0) += 1;
    }

    /// Record an upload skipped for size
    pub fn record_oversized(&mut self) {
        self.oversized_skipped += 1;
    }

    /// Record one retry
    pub fn record_retry(&mut self) {
        self.retries_issued += 1;
    }

    /// Soft failures across all tags
    pub fn total_soft_failures(&self) -> usize {
        self.soft_failures.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Ingestion Metrics Summary".to_string(),
            "=========================".to_string(),
            format!(
                "Batches: {} started, {} succeeded, {} failed",
                self.batches_started, self.batches_succeeded, self.batches_failed
            ),
            format!("Files dispatched: {}", self.files_dispatched),
            format!("Retries issued: {}", self.retries_issued),
            format!("Oversized uploads skipped: {}", self.oversized_skipped),
        ];

        if !self.soft_failures.is_empty() {
            lines.push("Soft failures:".to_string());
            for (tag, count) in &self.soft_failures {
                lines.push(format!("  {}: {}", tag, count));
            }
            lines.push(format!("  Total: {}", self.total_soft_failures()));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_empty() {
        let metrics = IngestionMetrics::new();
        assert_eq!(metrics.batches_started, 0);
        assert_eq!(metrics.total_soft_failures(), 0);
    }

    #[test]
    fn test_record_batches() {
        let mut metrics = IngestionMetrics::new();
        metrics.record_batch_started();
        metrics.record_batch_succeeded(3);
        metrics.record_batch_started();
        metrics.record_batch_failed();

        assert_eq!(metrics.batches_started, 2);
        assert_eq!(metrics.batches_succeeded, 1);
        assert_eq!(metrics.batches_failed, 1);
        assert_eq!(metrics.files_dispatched, 3);
    }

    #[test]
    fn test_soft_failures_by_tag() {
        let mut metrics = IngestionMetrics::new();
        metrics.record_soft_failure("AiError");
        metrics.record_soft_failure("AiError");
        metrics.record_soft_failure("ZepError");

        assert_eq!(metrics.soft_failures["AiError"], 2);
        assert_eq!(metrics.total_soft_failures(), 3);
    }

    #[test]
    fn test_summary_lists_soft_failures() {
        let mut metrics = IngestionMetrics::new();
        metrics.record_soft_failure("ZepError");
        metrics.record_oversized();

        let summary = metrics.summary();
        assert!(summary.contains("Oversized uploads skipped: 1"));
        assert!(summary.contains("ZepError: 1"));
    }

    #[test]
    fn test_shared_record_and_snapshot() {
        let shared = IngestionMetrics::shared();
        record(&shared, |m| m.record_retry());
        record(&shared, |m| m.record_retry());
        assert_eq!(snapshot(&shared).retries_issued, 2);
    }

    #[test]
    fn test_reset() {
        let mut metrics = IngestionMetrics::new();
        metrics.record_retry();
        metrics.record_batch_started();
        metrics.reset();
        assert_eq!(metrics, IngestionMetrics::default());
    }
}
