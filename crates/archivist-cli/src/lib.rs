//! Archivist CLI library.
//!
//! Command-line client for Archivist runners: ingest an archive, analyze one
//! document, or drive a load test of single-document calls. Every call goes
//! through the same timeout, retry and classification policy the runners use
//! between themselves.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use error::{CliError, Result};
pub use output::{Formatter, OutputFormat};
