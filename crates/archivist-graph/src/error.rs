//! Error types for graph operations

use archivist_domain::{TooLargeError, ZepError};
use thiserror::Error;

/// Errors raised by graph clients
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success response from the store
    #[error("Graph store returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Missing or invalid client configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Store refused the call (used by the in-memory graph)
    #[error("Graph unavailable: {0}")]
    Unavailable(String),
}

/// Why an upload did not happen
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The store failed, after retries
    #[error(transparent)]
    Zep(#[from] ZepError),

    /// The payload was over the size gate; nothing was sent
    #[error(transparent)]
    TooLarge(#[from] TooLargeError),
}
