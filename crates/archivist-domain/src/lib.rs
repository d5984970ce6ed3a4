//! Archivist Domain Layer
//!
//! Core vocabulary shared by every Archivist crate: the documents that flow
//! through the ingestion pipeline, the closed error taxonomy, the classifier
//! that decides between soft results, retries and escalation, and the trait
//! seams behind which the completion service, the knowledge graph and the
//! invocation substrate live.
//!
//! ## Key Concepts
//!
//! - **Archive**: a zip or tar.gz bundle of documents addressed by URL
//! - **DomainError**: an expected failure with a known recovery (soft result, no retry)
//! - **Substrate**: whatever routes an entity call by key to a live runner
//! - **ClusterProblem**: the terminal escalation when something unrecognized fails
//!
//! ## Architecture
//!
//! Infrastructure implementations live in other crates:
//! - `archivist-llm` implements [`CompletionProvider`] and [`Tokenizer`]
//! - `archivist-graph` implements [`GraphClient`]
//! - `archivist-ingest` and `archivist-runner` implement [`DocumentDispatcher`]
//!   and [`ArchivistClient`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classify;
pub mod completion;
pub mod document;
pub mod error;
pub mod graph;
pub mod retry;
pub mod traits;

// Re-exports for convenience
pub use classify::{
    resolve, Classify, ClassifiedError, ErrorClass, Resolution, SoftResult,
    CATASTROPHE_PREFIX,
};
pub use completion::{ChatMessage, CompletionRequest, Role};
pub use document::{
    AnalysisResult, AnalyzeDocumentRequest, AnalyzeDocumentResponse, ArchiveRequest,
    CollectedFile, PrepareDocumentsResponse,
};
pub use error::{
    AiError, AnalyzeError, ArchiveError, ArchiveErrorKind, ClusterProblem, DomainError,
    InvokeError, PrepareError, SubstrateError, TooLargeError, ZepError,
};
pub use graph::{EpisodeRecord, GraphEpisode, GraphGroup, GroupCreation};
pub use retry::RetryPolicy;
pub use traits::{
    ArchivistClient, CompletionProvider, DocumentDispatcher, GraphClient, Tokenizer,
};
