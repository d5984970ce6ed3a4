//! Archivist Ingestion Pipeline
//!
//! The two entity handlers of the Archivist system and the call policy that
//! connects them.
//!
//! # Architecture
//!
//! ```text
//! PrepareDocuments(key, archiveUrl)
//!   └─ IngestionCoordinator
//!        ├─ ArchiveFetcher / FileCollector
//!        └─ per file: invoke(CallPolicy, DocumentDispatcher::analyze_document)
//!                       └─ DocumentWorker: DocumentAnalyzer → KnowledgeGraphUploader
//! ```
//!
//! Every per-file outcome is classified: success, a soft result that is
//! logged and counted, or a `ClusterProblem` that fails the whole batch.
//!
//! # Example Usage
//!
//! ```no_run
//! use archivist_analyzer::{AnalyzerConfig, DocumentAnalyzer};
//! use archivist_archive::ArchiveFetcher;
//! use archivist_domain::ArchiveRequest;
//! use archivist_graph::{GraphConfig, InMemoryGraph, KnowledgeGraphUploader};
//! use archivist_ingest::{DocumentWorker, IngestConfig, IngestionCoordinator, LocalDispatcher};
//! use archivist_llm::MockProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = IngestConfig::default();
//! let worker = DocumentWorker::new(
//!     DocumentAnalyzer::new(MockProvider::new("summary"), AnalyzerConfig::default()),
//!     KnowledgeGraphUploader::new(InMemoryGraph::new(), GraphConfig::default()),
//! );
//! let dispatcher = Arc::new(LocalDispatcher::new(Arc::new(worker)));
//! let coordinator = IngestionCoordinator::new(
//!     ArchiveFetcher::new(config.download_timeout())?,
//!     dispatcher,
//!     config,
//! );
//!
//! let response = coordinator
//!     .prepare_documents("batch-1", ArchiveRequest::new("https://example.com/docs.zip"))
//!     .await?;
//! println!("{} files", response.file_count);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod call;
pub mod config;
pub mod coordinator;
pub mod local;
pub mod metrics;
pub mod worker;

pub use call::{invoke, CallPolicy};
pub use config::{IngestConfig, DEFAULT_SINGLE_CALL_RETRIES, DEFAULT_SINGLE_CALL_TIMEOUT_MS};
pub use coordinator::{BatchState, IngestionCoordinator};
pub use local::LocalDispatcher;
pub use metrics::{IngestionMetrics, SharedMetrics};
pub use worker::DocumentWorker;
