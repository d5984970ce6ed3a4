//! Archivist Completion Provider Layer
//!
//! Implementations of the [`CompletionProvider`] and [`Tokenizer`] traits from
//! `archivist-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OpenAiProvider`: OpenAI-compatible chat completions API
//!
//! # Examples
//!
//! ```
//! use archivist_domain::{ChatMessage, CompletionProvider, CompletionRequest};
//! use archivist_llm::MockProvider;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let provider = MockProvider::new("Hello from the model!");
//! let request = CompletionRequest::new(vec![ChatMessage::user("hi")]);
//! let result = rt.block_on(provider.complete(&request)).unwrap();
//! assert_eq!(result, "Hello from the model!");
//! ```

#![warn(missing_docs)]

pub mod bpe;
pub mod openai;
pub mod tokenizer;

use archivist_domain::{CompletionProvider, CompletionRequest, Tokenizer};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use bpe::BpeTokenizer;
pub use openai::OpenAiProvider;
pub use tokenizer::ApproxTokenizer;

/// Errors that can occur during completion calls
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Request rejected by the provider
    #[error("Request rejected ({status}): {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Missing or invalid provider configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::Communication(_) | LlmError::RateLimitExceeded)
    }
}

/// Mock completion provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls. A
/// scripted response is chosen when any message of the request contains its
/// trigger text; otherwise the default response is returned.
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<HashMap<String, Option<String>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    tokenizer: ApproxTokenizer,
}

impl MockProvider {
    /// Create a MockProvider with a fixed response for all requests
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            tokenizer: ApproxTokenizer::default(),
        }
    }

    /// Respond with `response` when a message contains `trigger`
    pub fn add_response(&self, trigger: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(trigger.into(), Some(response.into()));
    }

    /// Fail when a message contains `trigger`
    pub fn add_error(&self, trigger: impl Into<String>) {
        self.responses.lock().unwrap().insert(trigger.into(), None);
    }

    /// Number of completion calls received
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Forget recorded requests
    pub fn reset(&self) {
        self.requests.lock().unwrap().clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        "mock"
    }

    fn tokenizer(&self) -> &dyn Tokenizer {
        &self.tokenizer
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        self.requests.lock().unwrap().push(request.clone());

        let responses = self.responses.lock().unwrap();
        for (trigger, response) in responses.iter() {
            if request.messages.iter().any(|m| m.content.contains(trigger)) {
                return response
                    .clone()
                    .ok_or_else(|| LlmError::Other("Mock error".to_string()));
            }
        }

        Ok(self.default_response.clone())
    }
}
