//! Configuration for the knowledge graph uploader

use archivist_domain::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding the target group
pub const GROUP_ID_ENV: &str = "ZEP_GROUP_ID";

/// Environment variable overriding the store's base URL
pub const BASE_URL_ENV: &str = "ZEP_BASE_URL";

/// Configuration for the knowledge graph uploader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Base URL of the Zep-compatible API
    pub base_url: String,

    /// Group every episode is uploaded to
    pub group_id: String,

    /// Largest serialized payload sent to the store (characters)
    pub max_payload_chars: usize,

    /// Maximum time for a single store call (seconds)
    pub request_timeout_secs: u64,

    /// Retry budget for failed uploads
    pub retry: RetryPolicy,
}

impl GraphConfig {
    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Apply `ZEP_GROUP_ID` and `ZEP_BASE_URL` when set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(group_id) = std::env::var(GROUP_ID_ENV) {
            self.group_id = group_id;
        }
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            self.base_url = base_url;
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("base_url must not be empty".to_string());
        }
        if self.group_id.trim().is_empty() {
            return Err("group_id must not be empty".to_string());
        }
        if self.max_payload_chars == 0 {
            return Err("max_payload_chars must be greater than 0".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
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

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.getzep.com/api/v2".to_string(),
            group_id: "default".to_string(),
            max_payload_chars: 10_000,
            request_timeout_secs: 30,
            retry: RetryPolicy::default(),
        }
    }
}
