//! CLI command definitions and argument parsing.

use crate::output::OutputFormat;
use archivist_ingest::{DEFAULT_SINGLE_CALL_RETRIES, DEFAULT_SINGLE_CALL_TIMEOUT_MS};
use clap::{Parser, Subcommand};

/// Default runner endpoint
pub const DEFAULT_RUNNER_URL: &str = "http://127.0.0.1:8080";

/// Archivist CLI - Send archives and documents to an Archivist runner.
#[derive(Debug, Parser)]
#[command(name = "archivist")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Runner URL
    #[arg(short, long, global = true, env = "ARCHIVIST_RUNNER_URL", default_value = DEFAULT_RUNNER_URL)]
    pub runner: String,

    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest an archive
    Prepare(PrepareArgs),

    /// Analyze a single document
    Analyze(AnalyzeArgs),

    /// Send many single-document calls and report the outcome counts
    LoadTest(LoadTestArgs),
}

/// Arguments for the prepare command.
#[derive(Debug, Parser)]
pub struct PrepareArgs {
    /// Archive URL (.zip or .tar.gz; http, https or file)
    pub archive_url: String,

    /// Entity key of the Archivist handling the archive
    #[arg(short, long, default_value = "archivist")]
    pub key: String,

    /// Extra attempts after a transient failure
    #[arg(long, default_value = "0")]
    pub retries: u32,
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Document name
    pub name: String,

    /// Document text
    #[arg(short, long, conflicts_with = "file")]
    pub content: Option<String>,

    /// Read the document text from a file
    #[arg(long)]
    pub file: Option<String>,

    /// Entity key; defaults to the document name
    #[arg(short, long)]
    pub key: Option<String>,

    /// Timeout per attempt (milliseconds)
    #[arg(short, long, default_value_t = DEFAULT_SINGLE_CALL_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Extra attempts after a transient failure
    #[arg(long, default_value_t = DEFAULT_SINGLE_CALL_RETRIES)]
    pub retries: u32,
}

/// Arguments for the load-test command.
#[derive(Debug, Parser)]
pub struct LoadTestArgs {
    /// Number of calls
    #[arg(short = 'n', long, default_value = "30")]
    pub times: usize,

    /// Calls in flight at once
    #[arg(short, long, default_value = "15")]
    pub concurrency: usize,

    /// Extra attempts per call after a transient failure
    #[arg(long, default_value_t = DEFAULT_SINGLE_CALL_RETRIES)]
    pub retries: u32,

    /// Timeout per attempt (milliseconds)
    #[arg(short, long, default_value_t = DEFAULT_SINGLE_CALL_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Document text sent with every call
    #[arg(short, long, default_value = "test")]
    pub document: String,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => OutputFormat::Table,
            CliFormat::Json => OutputFormat::Json,
        }
    }
}
