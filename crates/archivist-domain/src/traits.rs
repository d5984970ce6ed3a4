//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the ingestion pipeline and the
//! services it talks to. Implementations live in other crates.

use crate::completion::CompletionRequest;
use crate::document::{
    AnalyzeDocumentRequest, AnalyzeDocumentResponse, ArchiveRequest, PrepareDocumentsResponse,
};
use crate::error::{AnalyzeError, InvokeError, PrepareError};
use crate::graph::{EpisodeRecord, GraphEpisode, GraphGroup, GroupCreation};
use async_trait::async_trait;
use std::fmt::Display;

/// Counts and cuts text in model tokens
///
/// Implemented by the infrastructure layer (archivist-llm)
pub trait Tokenizer: Send + Sync {
    /// Number of tokens `text` encodes to
    fn count_tokens(&self, text: &str) -> usize;

    /// Longest prefix of `text` that fits in `max_tokens`
    fn truncate(&self, text: &str, max_tokens: usize) -> String;
}

/// Chat completion service
///
/// Implemented by the infrastructure layer (archivist-llm)
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Error type for completion calls
    type Error: Display + Send;

    /// Model the provider sends requests to
    fn model_name(&self) -> &str;

    /// Tokenizer matching the provider's model
    fn tokenizer(&self) -> &dyn Tokenizer;

    /// Run one chat completion and return the first choice's text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error>;
}

/// Knowledge graph store
///
/// Implemented by the infrastructure layer (archivist-graph)
#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Error type for graph calls
    type Error: Display + Send;

    /// Look up a group; `None` when it does not exist
    async fn get_group(&self, group_id: &str) -> Result<Option<GraphGroup>, Self::Error>;

    /// Create a group
    async fn add_group(&self, group: &GraphGroup) -> Result<GroupCreation, Self::Error>;

    /// Store one episode
    async fn add_episode(&self, episode: &GraphEpisode) -> Result<EpisodeRecord, Self::Error>;
}

/// Routes `AnalyzeDocument` calls to the entity owning `key`
///
/// This is the only capability the fan-out needs, which keeps the coordinator
/// independent of the client that invokes it.
#[async_trait]
pub trait DocumentDispatcher: Send + Sync {
    /// Analyze and upload one document
    async fn analyze_document(
        &self,
        key: &str,
        request: AnalyzeDocumentRequest,
    ) -> Result<AnalyzeDocumentResponse, InvokeError<AnalyzeError>>;
}

/// Full Archivist entity client
#[async_trait]
pub trait ArchivistClient: DocumentDispatcher {
    /// Ingest one archive
    async fn prepare_documents(
        &self,
        key: &str,
        request: ArchiveRequest,
    ) -> Result<PrepareDocumentsResponse, InvokeError<PrepareError>>;
}
