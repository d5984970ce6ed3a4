//! HTTP client for calling entity operations on a runner.
//!
//! Typed failures come back as `422`/`500` with `{"error": {"_tag": ...}}`
//! bodies and are rebuilt into the operation's error type. Anything the
//! client cannot interpret is a [`SubstrateError`].

use crate::handlers::{ErrorResponse, HealthCheckResponse, REQUEST_ID_HEADER};
use archivist_domain::{
    AnalyzeDocumentRequest, AnalyzeDocumentResponse, AnalyzeError, ArchiveRequest,
    ArchivistClient, DocumentDispatcher, InvokeError, PrepareDocumentsResponse, PrepareError,
    SubstrateError,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Operation path of `PrepareDocuments`
pub const PREPARE_DOCUMENTS: &str = "prepare-documents";

/// Operation path of `AnalyzeDocument`
pub const ANALYZE_DOCUMENT: &str = "analyze-document";

/// Client for one runner
pub struct RunnerClient {
    base_url: Url,
    timeout: Duration,
    client: reqwest::Client,
}

impl RunnerClient {
    /// Create a client for the runner at `endpoint`
    ///
    /// `timeout` bounds each call end to end.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, SubstrateError> {
        let base_url = Url::parse(endpoint)
            .map_err(|e| SubstrateError::Protocol(format!("Invalid runner endpoint '{}': {}", endpoint, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SubstrateError::Protocol(format!(
                "Invalid runner endpoint '{}'",
                endpoint
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubstrateError::Protocol(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            timeout,
            client,
        })
    }

    /// Endpoint of the runner
    pub fn endpoint(&self) -> &str {
        self.base_url.as_str()
    }

    /// URL of an entity operation; the key is percent-encoded as one segment
    pub fn operation_url(&self, key: &str, operation: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["entity", "archivist", key, operation]);
        }
        url
    }

    /// Fetch the runner's health report
    pub async fn health(&self) -> Result<HealthCheckResponse, SubstrateError> {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("health");
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        if !response.status().is_success() {
            return Err(SubstrateError::Remote(format!(
                "Health check returned HTTP {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| SubstrateError::Protocol(format!("Invalid health report: {}", e)))
    }

    async fn call<B, T, E>(&self, key: &str, operation: &str, body: &B) -> Result<T, InvokeError<E>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
        E: DeserializeOwned,
    {
        let url = self.operation_url(key, operation);
        let request_id = Uuid::now_v7();
        debug!("Calling {} ({})", url, request_id);

        let response = self
            .client
            .post(url)
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        if status.is_success() {
            return serde_json::from_slice(&bytes).map_err(|e| {
                SubstrateError::Protocol(format!("Invalid {} reply: {}", operation, e)).into()
            });
        }

        match serde_json::from_slice::<ErrorResponse<E>>(&bytes) {
            Ok(reply) => Err(InvokeError::Rpc(reply.error)),
            Err(_) => Err(SubstrateError::Remote(format!(
                "HTTP {}: {}",
                status,
                String::from_utf8_lossy(&bytes)
            ))
            .into()),
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> SubstrateError {
        if e.is_timeout() {
            SubstrateError::Timeout(self.timeout)
        } else if e.is_connect() {
            SubstrateError::Unreachable(e.to_string())
        } else if e.is_decode() {
            SubstrateError::Protocol(e.to_string())
        } else {
            SubstrateError::Unreachable(e.to_string())
        }
    }
}

#[async_trait]
impl DocumentDispatcher for RunnerClient {
    async fn analyze_document(
        &self,
        key: &str,
        request: AnalyzeDocumentRequest,
    ) -> Result<AnalyzeDocumentResponse, InvokeError<AnalyzeError>> {
        self.call(key, ANALYZE_DOCUMENT, &request).await
    }
}

#[async_trait]
impl ArchivistClient for RunnerClient {
    async fn prepare_documents(
        &self,
        key: &str,
        request: ArchiveRequest,
    ) -> Result<PrepareDocumentsResponse, InvokeError<PrepareError>> {
        self.call(key, PREPARE_DOCUMENTS, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> RunnerClient {
        RunnerClient::new(endpoint, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_operation_url() {
        let url = client("http://localhost:8080").operation_url("batch-1", PREPARE_DOCUMENTS);
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/entity/archivist/batch-1/prepare-documents"
        );
    }

    #[test]
    fn test_operation_url_encodes_key() {
        let url = client("http://localhost:8080/").operation_url("docs/a b.md", ANALYZE_DOCUMENT);
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/entity/archivist/docs%2Fa%20b.md/analyze-document"
        );
    }

    #[test]
    fn test_operation_url_keeps_base_path() {
        let url = client("http://localhost:8080/runners/0").operation_url("k", ANALYZE_DOCUMENT);
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/runners/0/entity/archivist/k/analyze-document"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            RunnerClient::new("not a url", Duration::from_secs(1)),
            Err(SubstrateError::Protocol(_))
        ));
        assert!(RunnerClient::new("mailto:someone@example.com", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_runner() {
        let client = client("http://127.0.0.1:1");
        let err = client
            .analyze_document("k", AnalyzeDocumentRequest::new("a.md", "text"))
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Substrate(SubstrateError::Unreachable(_))));
        assert!(err.is_retryable());
    }
}
