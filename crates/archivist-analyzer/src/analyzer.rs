//! Core DocumentAnalyzer implementation

use crate::config::AnalyzerConfig;
use crate::prompt::PromptBuilder;
use archivist_domain::{AiError, AnalysisResult, CompletionProvider};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Produces a short natural-language analysis of one document
pub struct DocumentAnalyzer<P>
where
    P: CompletionProvider,
{
    provider: Arc<P>,
    config: AnalyzerConfig,
}

impl<P> DocumentAnalyzer<P>
where
    P: CompletionProvider,
{
    /// Create a new DocumentAnalyzer
    pub fn new(provider: P, config: AnalyzerConfig) -> Self {
        Self::from_shared(Arc::new(provider), config)
    }

    /// Create a DocumentAnalyzer around an already shared provider
    pub fn from_shared(provider: Arc<P>, config: AnalyzerConfig) -> Self {
        Self { provider, config }
    }

    /// Active configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze one document
    ///
    /// # Errors
    ///
    /// Every failure, including truncation and timeouts, is an `AiError`.
    #[instrument(skip_all, fields(document = %name))]
    pub async fn analyze(&self, name: &str, content: &str) -> Result<AnalysisResult, AiError> {
        let request =
            PromptBuilder::new(content).build(self.provider.tokenizer(), self.config.token_budget)?;

        debug!(
            "Analyzing {} chars with {} ({} tokens)",
            content.len(),
            self.provider.model_name(),
            request.token_count(self.provider.tokenizer())
        );

        let completion = timeout(self.config.request_timeout(), self.provider.complete(&request))
            .await
            .map_err(|_| {
                AiError::new("Completion timed out")
                    .with_cause(format!("{:?}", self.config.request_timeout()))
            })?;

        match completion {
            Ok(text) => {
                info!("Analyzed document '{}'", name);
                Ok(AnalysisResult {
                    document_name: name.to_string(),
                    analysis_text: text,
                })
            }
            Err(e) => {
                warn!("Analysis of '{}' failed: {}", name, e);
                Err(AiError::new("Failed to analyze document").with_cause(e))
            }
        }
    }
}
