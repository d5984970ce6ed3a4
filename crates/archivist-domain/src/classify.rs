//! Error classification
//!
//! Applied at every boundary that crosses the invocation substrate. A failure
//! is one of three things:
//!
//! | Class | Source | Policy |
//! |-------|--------|--------|
//! | Domain | `ArchiveError`, `AiError`, `ZepError`, `TooLargeError` | soft result, never retried |
//! | Transient | any [`SubstrateError`] | retried by the dispatch layer, then escalated |
//! | Fatal | `ClusterProblem` | escalated immediately |
//!
//! The mapping is an exhaustive `match` over closed enums, so adding a new
//! failure shape fails to compile until it is classified.

use crate::error::{
    AnalyzeError, ClusterProblem, DomainError, InvokeError, PrepareError, SubstrateError,
};
use serde::{Deserialize, Serialize};

/// Prefix of every escalation message
pub const CATASTROPHE_PREFIX: &str = "Something catastrophic happened -> ";

/// Coarse class of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Known failure with a soft recovery
    Domain,
    /// Retryable substrate failure
    Transient,
    /// Escalate now
    Fatal,
}

/// A failure after classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedError {
    /// Known failure, converted to a soft result by the caller
    Domain(DomainError),
    /// Substrate failure, eligible for retry
    Transient(SubstrateError),
    /// Terminal failure
    Fatal(ClusterProblem),
}

impl ClassifiedError {
    /// Class of this failure
    pub fn class(&self) -> ErrorClass {
        match self {
            ClassifiedError::Domain(_) => ErrorClass::Domain,
            ClassifiedError::Transient(_) => ErrorClass::Transient,
            ClassifiedError::Fatal(_) => ErrorClass::Fatal,
        }
    }

    /// Whether the dispatch layer may try again
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClassifiedError::Transient(_))
    }

    /// Tag of the underlying error type
    pub fn tag(&self) -> &'static str {
        match self {
            ClassifiedError::Domain(e) => e.tag(),
            ClassifiedError::Transient(e) => e.tag(),
            ClassifiedError::Fatal(_) => "ClusterProblem",
        }
    }

    /// Turn a non-domain failure into the terminal escalation
    ///
    /// Domain failures are escalated too when a caller has no way to degrade
    /// them; the message names the error tag either way.
    pub fn escalate(self) -> ClusterProblem {
        match self {
            ClassifiedError::Fatal(problem) => problem,
            ClassifiedError::Transient(e) => {
                ClusterProblem::new(format!("{}{}", CATASTROPHE_PREFIX, e.tag())).with_cause(e)
            }
            ClassifiedError::Domain(e) => {
                ClusterProblem::new(format!("{}{}", CATASTROPHE_PREFIX, e.tag())).with_cause(e)
            }
        }
    }
}

/// Failures that know their own class
pub trait Classify {
    /// Classify this failure
    fn classify(self) -> ClassifiedError;
}

impl Classify for InvokeError<AnalyzeError> {
    fn classify(self) -> ClassifiedError {
        match self {
            InvokeError::Rpc(e) => ClassifiedError::Domain(e.into()),
            InvokeError::Substrate(e) => ClassifiedError::Transient(e),
        }
    }
}

impl Classify for InvokeError<PrepareError> {
    fn classify(self) -> ClassifiedError {
        match self {
            InvokeError::Rpc(PrepareError::Archive(e)) => ClassifiedError::Domain(e.into()),
            InvokeError::Rpc(PrepareError::ClusterProblem(p)) => ClassifiedError::Fatal(p),
            InvokeError::Substrate(e) => ClassifiedError::Transient(e),
        }
    }
}

impl Classify for SubstrateError {
    fn classify(self) -> ClassifiedError {
        ClassifiedError::Transient(self)
    }
}

impl<E> InvokeError<E> {
    /// Whether this failure classifies as `Transient`
    ///
    /// Only substrate failures are; a typed reply from the handler is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InvokeError::Substrate(_))
    }
}

/// Successful-shaped outcome standing in for a recognized domain failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftResult {
    /// Tag of the domain error that was degraded
    pub tag: String,
    /// What the Archivist could not do
    pub message: String,
    /// Always empty; present so the shape matches a real analysis
    pub analysis: String,
    /// Message of the underlying error
    pub detail: String,
}

impl SoftResult {
    /// Build the soft result for a domain failure
    pub fn from_domain(error: &DomainError) -> Self {
        let message = match error {
            DomainError::Archive(_) => "Archivist failed to read the archive",
            DomainError::Ai(_) => "Archivist failed to analyze document",
            DomainError::Zep(_) => "Archivist failed to upload analysis to the knowledge graph",
            DomainError::TooLarge(_) => "Archivist skipped a document too large to upload",
        };
        Self {
            tag: error.tag().to_string(),
            message: message.to_string(),
            analysis: String::new(),
            detail: error.to_string(),
        }
    }
}

/// Outcome of a call once classification has run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// The call succeeded
    Success(T),
    /// The call failed with a domain error and was degraded
    Soft(SoftResult),
}

impl<T> Resolution<T> {
    /// Whether the call actually succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Resolution::Success(_))
    }
}

/// Apply the classification policy to a finished call
///
/// Retries, if any, must already have happened: a transient failure reaching
/// this point is escalated.
pub fn resolve<T, E: Classify>(result: Result<T, E>) -> Result<Resolution<T>, ClusterProblem> {
    match result {
        Ok(value) => Ok(Resolution::Success(value)),
        Err(e) => match e.classify() {
            ClassifiedError::Domain(domain) => Ok(Resolution::Soft(SoftResult::from_domain(&domain))),
            other => Err(other.escalate()),
        },
    }
}
