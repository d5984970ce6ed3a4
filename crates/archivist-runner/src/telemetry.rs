//! Tracing initialization for Archivist binaries.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Set when running as an ECS task
pub const CONTAINER_ENV: &str = "ECS_CONTAINER_METADATA_URI_V4";

/// Log format for the current environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Human-readable text
    Pretty,
}

impl LogFormat {
    /// JSON inside a container, text otherwise
    pub fn detect() -> Self {
        if std::env::var_os(CONTAINER_ENV).is_some() {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Install the global subscriber
///
/// Filtering follows `RUST_LOG` and defaults to `info`. Calling this more than
/// once keeps the first subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match LogFormat::detect() {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Tracing already initialized");
    }
}
