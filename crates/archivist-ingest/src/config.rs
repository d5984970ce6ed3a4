//! Configuration for archive ingestion

use crate::call::CallPolicy;
use archivist_domain::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default single-document timeout (milliseconds)
pub const DEFAULT_SINGLE_CALL_TIMEOUT_MS: u64 = 3_000;

/// Default extra attempts for a single-document call
pub const DEFAULT_SINGLE_CALL_RETRIES: u32 = 0;

/// Configuration for the IngestionCoordinator and single-document calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum `AnalyzeDocument` calls in flight per archive
    pub concurrency: usize,

    /// Timeout of one single-document call (milliseconds)
    pub single_call_timeout_ms: u64,

    /// Extra attempts for a single-document call
    pub single_call_retries: u32,

    /// Maximum time to download one archive (seconds)
    pub download_timeout_secs: u64,

    /// Retry budget of each per-file call during fan-out
    pub retry: RetryPolicy,
}

impl IngestConfig {
    /// Single-document timeout as a Duration
    pub fn single_call_timeout(&self) -> Duration {
        Duration::from_millis(self.single_call_timeout_ms)
    }

    /// Call policy of one single-document call
    ///
    /// Retries, when enabled, back off like the fan-out's.
    pub fn single_document_policy(&self) -> CallPolicy {
        CallPolicy::new(
            Some(self.single_call_timeout()),
            RetryPolicy::new(self.single_call_retries, self.retry.base_delay()),
        )
    }

    /// Per-file call policy of the fan-out; no timeout, fan-out retry budget
    pub fn fan_out_policy(&self) -> CallPolicy {
        CallPolicy::new(None, self.retry)
    }

    /// Download timeout as a Duration
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }
        if self.single_call_timeout_ms == 0 {
            return Err("single_call_timeout_ms must be greater than 0".to_string());
        }
        if self.download_timeout_secs == 0 {
            return Err("download_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for IngestConfig {
    /// Five files in flight, 3 retries from 1s, 3s single-call timeout
    fn default() -> Self {
        Self {
            concurrency: 5,
            single_call_timeout_ms: DEFAULT_SINGLE_CALL_TIMEOUT_MS,
            single_call_retries: DEFAULT_SINGLE_CALL_RETRIES,
            download_timeout_secs: 300,
            retry: RetryPolicy::default(),
        }
    }
}

impl IngestConfig {
    /// Aggressive preset: wider fan-out, fewer and faster retries
    pub fn aggressive() -> Self {
        Self {
            concurrency: 20,
            retry: RetryPolicy::new(1, Duration::from_millis(500)),
            ..Self::default()
        }
    }

    /// Lenient preset: narrow fan-out, more patient retries
    pub fn lenient() -> Self {
        Self {
            concurrency: 2,
            single_call_timeout_ms: 10_000,
            single_call_retries: 2,
            download_timeout_secs: 900,
            retry: RetryPolicy::new(5, Duration::from_secs(2)),
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read {}: {}", path.as_ref().display(), e))?;
        Self::from_toml(&content)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = IngestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.single_call_timeout(), Duration::from_secs(3));
        assert_eq!(config.single_call_retries, 0);
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_single_document_policy_follows_config() {
        let policy = IngestConfig::default().single_document_policy();
        assert_eq!(policy.timeout, CallPolicy::single_document().timeout);
        assert_eq!(policy.retry.max_retries, 0);

        let config = IngestConfig {
            single_call_timeout_ms: 750,
            single_call_retries: 2,
            retry: RetryPolicy::new(3, Duration::from_millis(100)),
            ..IngestConfig::default()
        };
        let policy = config.single_document_policy();
        assert_eq!(policy.timeout, Some(Duration::from_millis(750)));
        assert_eq!(policy.retry.max_retries, 2);
        assert_eq!(policy.retry.base_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_fan_out_policy_has_no_timeout() {
        let config = IngestConfig::lenient();
        let policy = config.fan_out_policy();
        assert_eq!(policy.timeout, None);
        assert_eq!(policy.retry, config.retry);
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(IngestConfig::aggressive().validate().is_ok());
        assert!(IngestConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = IngestConfig {
            concurrency: 0,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = IngestConfig::lenient();
        let parsed = IngestConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }
}
