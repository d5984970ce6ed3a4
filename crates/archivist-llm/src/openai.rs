//! OpenAI Provider Implementation
//!
//! Talks to any OpenAI-compatible `chat/completions` endpoint.
//!
//! # Features
//!
//! - Async HTTP communication with bearer-token auth
//! - Optional organization header
//! - Retry of rate limits, 5xx responses and transport failures with
//!   exponential backoff (500ms, 1s, 2s by default)
//! - API key held as a [`SecretString`] so it never reaches logs
//! - Token counts from the model's own BPE encoding
//!
//! # Examples
//!
//! ```no_run
//! use archivist_llm::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env("gpt-4o-mini").unwrap();
//! ```

use crate::bpe::BpeTokenizer;
use crate::LlmError;
use archivist_domain::{
    ChatMessage, CompletionProvider, CompletionRequest, RetryPolicy, Tokenizer,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default API base URL
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default timeout for completion requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable holding the optional organization id
pub const ORGANIZATION_ENV: &str = "OPENAI_ORGANIZATION";

/// Environment variable overriding the API base URL
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Retry budget for transient provider failures
pub fn default_retry_policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(500))
}

/// OpenAI-compatible completion provider
pub struct OpenAiProvider {
    endpoint: String,
    model: String,
    api_key: SecretString,
    organization: Option<String>,
    client: reqwest::Client,
    retry: RetryPolicy,
    tokenizer: BpeTokenizer,
}

/// Request body for the chat completions API
#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

/// Response from the chat completions API
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider for the default endpoint
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Configuration` if the HTTP client or the model's
    /// tokenizer cannot be built.
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Result<Self, LlmError> {
        let model = model.into();
        let tokenizer = BpeTokenizer::for_model(&model)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model,
            api_key,
            organization: None,
            client,
            retry: default_retry_policy(),
            tokenizer,
        })
    }

    /// Create a provider from `OPENAI_API_KEY`, `OPENAI_ORGANIZATION` and
    /// `OPENAI_BASE_URL`
    pub fn from_env(model: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| LlmError::Configuration(format!("{} is not set", API_KEY_ENV)))?;

        let mut provider = Self::new(SecretString::from(api_key), model)?;
        if let Ok(organization) = std::env::var(ORGANIZATION_ENV) {
            provider = provider.with_organization(organization);
        }
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            provider = provider.with_endpoint(base_url);
        }
        Ok(provider)
    }

    /// Use a different API base URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Send the `OpenAI-Organization` header
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Set the retry policy for transient failures
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_once(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = ChatCompletionBody {
            model: &self.model,
            messages: &request.messages,
        };

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body);
        if let Some(organization) = &self.organization {
            builder = builder.header("OpenAI-Organization", organization);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            let parsed = response
                .json::<ChatCompletionResponse>()
                .await
                .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
            return first_choice(parsed);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(status_error(status, error_text, &self.model))
    }
}

fn first_choice(response: ChatCompletionResponse) -> Result<String, LlmError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| LlmError::InvalidResponse("Response contained no message".to_string()))
}

fn status_error(status: reqwest::StatusCode, body: String, model: &str) -> LlmError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimitExceeded
    } else if status == reqwest::StatusCode::NOT_FOUND {
        LlmError::ModelNotAvailable(model.to_string())
    } else if status.is_server_error() {
        LlmError::Communication(format!("HTTP {}: {}", status, body))
    } else {
        LlmError::Rejected {
            status: status.as_u16(),
            body,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    fn tokenizer(&self) -> &dyn Tokenizer {
        &self.tokenizer
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        debug!(
            "Sending {} messages to {} ({})",
            request.messages.len(),
            self.model,
            self.endpoint
        );

        let result = self
            .retry
            .run_if(|_| self.send_once(request), LlmError::is_transient)
            .await;

        if let Err(e) = &result {
            warn!("Completion failed for model {}: {}", self.model, e);
        }
        result
    }
}
