//! `AnalyzeDocument` entity handler

use crate::metrics::{self, IngestionMetrics, SharedMetrics};
use archivist_analyzer::DocumentAnalyzer;
use archivist_domain::{
    AnalyzeDocumentRequest, AnalyzeDocumentResponse, AnalyzeError, CompletionProvider, GraphClient,
};
use archivist_graph::{KnowledgeGraphUploader, UploadError};
use tracing::{info, instrument, warn};

/// Analyzes one document and records the analysis in the knowledge graph
///
/// A document whose record is too large for the graph still counts as
/// analyzed: the upload is skipped with a warning.
pub struct DocumentWorker<P, G>
where
    P: CompletionProvider,
    G: GraphClient,
{
    analyzer: DocumentAnalyzer<P>,
    uploader: KnowledgeGraphUploader<G>,
    metrics: SharedMetrics,
}

impl<P, G> DocumentWorker<P, G>
where
    P: CompletionProvider,
    G: GraphClient,
{
    /// Create a new worker
    pub fn new(analyzer: DocumentAnalyzer<P>, uploader: KnowledgeGraphUploader<G>) -> Self {
        Self {
            analyzer,
            uploader,
            metrics: IngestionMetrics::shared(),
        }
    }

    /// Record into an existing metrics handle
    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Metrics handle this worker records into
    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    /// Handle one `AnalyzeDocument` call
    #[instrument(skip_all, fields(address = %request.name, pid = std::process::id()))]
    pub async fn analyze_document(
        &self,
        request: AnalyzeDocumentRequest,
    ) -> Result<AnalyzeDocumentResponse, AnalyzeError> {
        info!("Analyzing document {}", request.name);
        let analysis = self.analyzer.analyze(&request.name, &request.content).await?;

        info!("Updating knowledge graph for {}", request.name);
        match self
            .uploader
            .upload(&request.name, &request.content, &analysis.analysis_text)
            .await
        {
            Ok(record) => info!(
                "Uploaded {} as node {}",
                request.name,
                record.name.as_deref().unwrap_or("<unnamed>")
            ),
            Err(UploadError::TooLarge(e)) => {
                warn!("Skipping too large document {}: {}", request.name, e);
                metrics::record(&self.metrics, |m| m.record_oversized());
            }
            Err(UploadError::Zep(e)) => return Err(e.into()),
        }

        info!("Completed analysis of {}", request.name);
        Ok(AnalyzeDocumentResponse {
            analysis: analysis.analysis_text,
        })
    }
}
