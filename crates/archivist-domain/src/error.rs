//! Error taxonomy
//!
//! Every failure the pipeline can observe is one of a small, closed set of
//! types. Domain failures (`ArchiveError`, `AiError`, `ZepError`,
//! `TooLargeError`) carry a known recovery policy; `SubstrateError` covers the
//! invocation layer itself; `ClusterProblem` is the terminal escalation.
//!
//! The domain errors are serializable with a `_tag` discriminator so a runner
//! can return them over the wire and the caller can rebuild the typed value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

fn describe(message: &str, cause: &Option<String>) -> String {
    match cause {
        Some(cause) => format!("{}: {}", message, cause),
        None => message.to_string(),
    }
}

/// Category of an archive failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveErrorKind {
    /// Extension is neither `.zip` nor `.tar.gz`
    UnsupportedFormat,
    /// The archive could not be fetched
    Download,
    /// The archive could not be unpacked
    Extraction,
    /// An extracted entry could not be stat'ed or read
    CollectionFailure,
}

impl ArchiveErrorKind {
    /// Stable string form
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveErrorKind::UnsupportedFormat => "unsupported_format",
            ArchiveErrorKind::Download => "download",
            ArchiveErrorKind::Extraction => "extraction",
            ArchiveErrorKind::CollectionFailure => "collection_failure",
        }
    }
}

impl fmt::Display for ArchiveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to fetch, extract or collect an archive
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}", describe(.message, .cause))]
pub struct ArchiveError {
    /// What stage failed
    pub kind: ArchiveErrorKind,
    /// Human-readable summary
    pub message: String,
    /// Underlying cause, stringified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ArchiveError {
    /// Create an archive error without a cause
    pub fn new(kind: ArchiveErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    /// Archive extension not handled
    pub fn unsupported_format(extension: &str) -> Self {
        Self::new(ArchiveErrorKind::UnsupportedFormat, "Unsupported archive format")
            .with_cause(format!("Unknown archive extension: {}", extension))
    }
}

/// Failure of the completion service, including tokenization and truncation
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}", describe(.message, .cause))]
pub struct AiError {
    /// Human-readable summary
    pub message: String,
    /// Underlying cause, stringified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl AiError {
    /// Create an AI error without a cause
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }
}

/// Failure of a knowledge-graph call
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}", describe(.message, .cause))]
pub struct ZepError {
    /// Human-readable summary
    pub message: String,
    /// Underlying cause, stringified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ZepError {
    /// Create a graph error without a cause
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }
}

/// Upload payload rejected by the local size gate
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[error("Data is too large: {size} characters (limit: {limit})")]
pub struct TooLargeError {
    /// Serialized payload size in characters
    pub size: usize,
    /// Configured limit in characters
    pub limit: usize,
}

/// Unrecognized failure; always terminal for the enclosing batch
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}", describe(.message, .cause))]
pub struct ClusterProblem {
    /// Human-readable summary
    pub message: String,
    /// Underlying cause, stringified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ClusterProblem {
    /// Create a cluster problem without a cause
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }
}

/// Error returned by the `AnalyzeDocument` operation
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum AnalyzeError {
    /// Analysis failed
    #[serde(rename = "AiError")]
    #[error(transparent)]
    Ai(AiError),

    /// Upload failed
    #[serde(rename = "ZepError")]
    #[error(transparent)]
    Zep(ZepError),
}

impl From<AiError> for AnalyzeError {
    fn from(e: AiError) -> Self {
        AnalyzeError::Ai(e)
    }
}

impl From<ZepError> for AnalyzeError {
    fn from(e: ZepError) -> Self {
        AnalyzeError::Zep(e)
    }
}

/// Error returned by the `PrepareDocuments` operation
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_tag")]
pub enum PrepareError {
    /// Fetching, extracting or collecting the archive failed
    #[serde(rename = "ArchiveError")]
    #[error(transparent)]
    Archive(ArchiveError),

    /// The fan-out escalated
    #[serde(rename = "ClusterProblem")]
    #[error(transparent)]
    ClusterProblem(ClusterProblem),
}

impl From<ArchiveError> for PrepareError {
    fn from(e: ArchiveError) -> Self {
        PrepareError::Archive(e)
    }
}

impl From<ClusterProblem> for PrepareError {
    fn from(e: ClusterProblem) -> Self {
        PrepareError::ClusterProblem(e)
    }
}

/// Any recognized domain failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Archive failure
    #[error(transparent)]
    Archive(ArchiveError),
    /// Completion failure
    #[error(transparent)]
    Ai(AiError),
    /// Graph failure
    #[error(transparent)]
    Zep(ZepError),
    /// Payload over the size gate
    #[error(transparent)]
    TooLarge(TooLargeError),
}

impl DomainError {
    /// Tag naming the error type
    pub fn tag(&self) -> &'static str {
        match self {
            DomainError::Archive(_) => "ArchiveError",
            DomainError::Ai(_) => "AiError",
            DomainError::Zep(_) => "ZepError",
            DomainError::TooLarge(_) => "TooLargeError",
        }
    }
}

impl From<AnalyzeError> for DomainError {
    fn from(e: AnalyzeError) -> Self {
        match e {
            AnalyzeError::Ai(e) => DomainError::Ai(e),
            AnalyzeError::Zep(e) => DomainError::Zep(e),
        }
    }
}

impl From<ArchiveError> for DomainError {
    fn from(e: ArchiveError) -> Self {
        DomainError::Archive(e)
    }
}

impl From<TooLargeError> for DomainError {
    fn from(e: TooLargeError) -> Self {
        DomainError::TooLarge(e)
    }
}

/// Failure of the invocation substrate itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubstrateError {
    /// The runner could not be reached
    #[error("Runner unreachable: {0}")]
    Unreachable(String),

    /// The call did not complete in time
    #[error("Call timed out after {0:?}")]
    Timeout(Duration),

    /// No live runner owns the key
    #[error("No runner available for key '{0}'")]
    NoRunner(String),

    /// The runner answered with something that is not a valid reply
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The runner failed while handling the call
    #[error("Runner failure: {0}")]
    Remote(String),
}

impl SubstrateError {
    /// Tag naming the failure shape, used in escalation messages
    pub fn tag(&self) -> &'static str {
        match self {
            SubstrateError::Unreachable(_) => "RunnerUnreachable",
            SubstrateError::Timeout(_) => "TimeoutException",
            SubstrateError::NoRunner(_) => "RunnerUnavailable",
            SubstrateError::Protocol(_) => "ProtocolError",
            SubstrateError::Remote(_) => "RunnerFailure",
        }
    }
}

/// Result of a call made through the substrate
///
/// `Rpc` carries the operation's own typed failure; `Substrate` means the call
/// never produced one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokeError<E> {
    /// The handler ran and failed with its declared error
    Rpc(E),
    /// Routing, transport or timeout failure
    Substrate(SubstrateError),
}

impl<E: fmt::Display> fmt::Display for InvokeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokeError::Rpc(e) => write!(f, "{}", e),
            InvokeError::Substrate(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for InvokeError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InvokeError::Rpc(e) => Some(e),
            InvokeError::Substrate(e) => Some(e),
        }
    }
}

impl<E> From<SubstrateError> for InvokeError<E> {
    fn from(e: SubstrateError) -> Self {
        InvokeError::Substrate(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_error_display_with_cause() {
        let err = ArchiveError::unsupported_format("rar");
        assert_eq!(err.kind, ArchiveErrorKind::UnsupportedFormat);
        assert_eq!(
            err.to_string(),
            "Unsupported archive format: Unknown archive extension: rar"
        );
    }

    #[test]
    fn test_error_display_without_cause() {
        assert_eq!(AiError::new("Model refused").to_string(), "Model refused");
    }

    #[test]
    fn test_analyze_error_tagged_json() {
        let err = AnalyzeError::Zep(ZepError::new("Failed to call Zep").with_cause("503"));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["_tag"], "ZepError");
        assert_eq!(json["message"], "Failed to call Zep");
        assert_eq!(json["cause"], "503");

        let back: AnalyzeError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_prepare_error_tagged_json() {
        let json = r#"{"_tag":"ArchiveError","kind":"unsupported_format","message":"Unsupported archive format"}"#;
        let err: PrepareError = serde_json::from_str(json).unwrap();
        match err {
            PrepareError::Archive(e) => assert_eq!(e.kind, ArchiveErrorKind::UnsupportedFormat),
            other => panic!("Expected ArchiveError, got {:?}", other),
        }
    }

    #[test]
    fn test_domain_error_tags() {
        assert_eq!(DomainError::from(AnalyzeError::Ai(AiError::new("x"))).tag(), "AiError");
        assert_eq!(
            DomainError::from(TooLargeError { size: 2, limit: 1 }).tag(),
            "TooLargeError"
        );
    }

    #[test]
    fn test_invoke_error_from_substrate() {
        let err: InvokeError<AnalyzeError> = SubstrateError::NoRunner("a.txt".into()).into();
        assert!(matches!(err, InvokeError::Substrate(SubstrateError::NoRunner(_))));
        assert_eq!(err.to_string(), "No runner available for key 'a.txt'");
    }
}
