//! `PrepareDocuments` orchestration
//!
//! A batch moves through `Fetching → Collecting → Dispatching → Aggregating`
//! and ends `Succeeded` or `Failed`. Each stage is logged as it starts.
//!
//! The fan-out is a `buffer_unordered` stream: at most `concurrency` per-file
//! calls are in flight. When one file escalates, the stream is dropped. Calls
//! in flight are cancelled at their next suspension point and queued files are
//! never dispatched; work a remote runner already received may still finish.

use crate::call::invoke;
use crate::config::IngestConfig;
use crate::metrics::{self, IngestionMetrics, SharedMetrics};
use archivist_archive::{ArchiveFetcher, ExtractedArchive, FileCollector};
use archivist_domain::{
    AnalyzeDocumentRequest, ArchiveError, ArchiveRequest, ClusterProblem, CollectedFile,
    DocumentDispatcher, PrepareDocumentsResponse, PrepareError, Resolution,
};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Stage of one `PrepareDocuments` batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// Downloading and unpacking the archive
    Fetching,
    /// Reading extracted files
    Collecting,
    /// Fanning out `AnalyzeDocument` calls
    Dispatching,
    /// Counting dispatched files
    Aggregating,
    /// Finished with a file count
    Succeeded,
    /// Finished with an error
    Failed,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchState::Fetching => "fetching",
            BatchState::Collecting => "collecting",
            BatchState::Dispatching => "dispatching",
            BatchState::Aggregating => "aggregating",
            BatchState::Succeeded => "succeeded",
            BatchState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Orchestrates archive ingestion
pub struct IngestionCoordinator {
    fetcher: ArchiveFetcher,
    collector: FileCollector,
    dispatcher: Arc<dyn DocumentDispatcher>,
    config: IngestConfig,
    metrics: SharedMetrics,
}

impl IngestionCoordinator {
    /// Create a coordinator dispatching per-file calls through `dispatcher`
    pub fn new(
        fetcher: ArchiveFetcher,
        dispatcher: Arc<dyn DocumentDispatcher>,
        config: IngestConfig,
    ) -> Self {
        Self {
            fetcher,
            collector: FileCollector::new(),
            dispatcher,
            config,
            metrics: IngestionMetrics::shared(),
        }
    }

    /// Record into an existing metrics handle
    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Metrics handle this coordinator records into
    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    /// Active configuration
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest one archive
    ///
    /// Returns the number of files dispatched, per-file soft failures
    /// included.
    ///
    /// # Errors
    ///
    /// - `Archive` if the archive cannot be fetched, unpacked or read
    /// - `ClusterProblem` if a per-file call fails in an unrecognized way
    ///   after its retries
    #[instrument(skip_all, fields(address = %key, pid = std::process::id()))]
    pub async fn prepare_documents(
        &self,
        key: &str,
        request: ArchiveRequest,
    ) -> Result<PrepareDocumentsResponse, PrepareError> {
        metrics::record(&self.metrics, |m| m.record_batch_started());

        match self.run_batch(&request).await {
            Ok(file_count) => {
                info!("Batch {}: {} files", BatchState::Succeeded, file_count);
                metrics::record(&self.metrics, |m| m.record_batch_succeeded(file_count));
                Ok(PrepareDocumentsResponse { file_count })
            }
            Err(e) => {
                error!("Batch {}: {}", BatchState::Failed, e);
                metrics::record(&self.metrics, |m| m.record_batch_failed());
                Err(e)
            }
        }
    }

    async fn run_batch(&self, request: &ArchiveRequest) -> Result<usize, PrepareError> {
        info!("Batch {}: {}", BatchState::Fetching, request.archive_url);
        let extracted = self.fetcher.extract(&request.archive_url).await?;

        info!("Batch {}: {}", BatchState::Collecting, extracted.path().display());
        let files = self.collect(&extracted).await?;
        let file_count = files.len();
        if let Err(e) = extracted.cleanup().await {
            warn!("Scratch directory not removed: {}", e);
        }

        info!(
            "Batch {}: {} files, concurrency {}",
            BatchState::Dispatching,
            file_count,
            self.config.concurrency
        );
        self.dispatch_all(files).await?;

        info!("Batch {}", BatchState::Aggregating);
        Ok(file_count)
    }

    async fn collect(
        &self,
        extracted: &ExtractedArchive,
    ) -> Result<Vec<CollectedFile>, ArchiveError> {
        self.collector.collect(extracted.path()).await
    }

    async fn dispatch_all(&self, files: Vec<CollectedFile>) -> Result<(), ClusterProblem> {
        let mut outcomes = stream::iter(files)
            .map(|file| self.dispatch_one(file))
            .buffer_unordered(self.config.concurrency.max(1));

        while let Some(outcome) = outcomes.next().await {
            // Returning drops the stream, cancelling whatever is still in flight
            outcome?;
        }
        Ok(())
    }

    async fn dispatch_one(&self, file: CollectedFile) -> Result<(), ClusterProblem> {
        let key = file.name.clone();
        let request = AnalyzeDocumentRequest::from(file);
        let policy = self.config.fan_out_policy();

        let dispatcher = self.dispatcher.as_ref();
        let shared = &self.metrics;
        let (key_ref, request_ref) = (key.as_str(), &request);

        let outcome = invoke(&policy, move |attempt| {
            if attempt > 0 {
                metrics::record(shared, |m| m.record_retry());
            }
            dispatcher.analyze_document(key_ref, request_ref.clone())
        })
        .await;

        match outcome {
            Ok(Resolution::Success(_)) => {
                debug!("Analyzed {}", key);
                Ok(())
            }
            Ok(Resolution::Soft(soft)) => {
                warn!("{} ({}): {}", soft.message, key, soft.detail);
                metrics::record(&self.metrics, |m| m.record_soft_failure(&soft.tag));
                Ok(())
            }
            Err(problem) => {
                error!("Escalating {}: {}", key, problem);
                Err(problem)
            }
        }
    }
}
