//! Error types for the CLI application.

use archivist_domain::{ClusterProblem, SubstrateError};
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// The runner could not be set up as a call target
    #[error("Connection error: {0}")]
    Connection(#[from] SubstrateError),

    /// The call escalated
    #[error("{0}")]
    ClusterProblem(#[from] ClusterProblem),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
