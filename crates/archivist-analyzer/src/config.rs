//! Configuration for the DocumentAnalyzer

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the DocumentAnalyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Maximum tokens of the whole request, instructions included
    pub token_budget: usize,

    /// Model the completion provider is created for
    pub model: String,

    /// Maximum time for a single completion call (seconds)
    pub request_timeout_secs: u64,
}

impl AnalyzerConfig {
    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.token_budget == 0 {
            return Err("token_budget must be greater than 0".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for AnalyzerConfig {
    /// Default configuration: 30k token budget on gpt-4o-mini
    fn default() -> Self {
        Self {
            token_budget: 30_000,
            model: "gpt-4o-mini".to_string(),
            request_timeout_secs: 120,
        }
    }
}

impl AnalyzerConfig {
    /// Aggressive preset: small budget and short timeout for cheap, fast runs
    pub fn aggressive() -> Self {
        Self {
            token_budget: 8_000,
            request_timeout_secs: 30,
            ..Self::default()
        }
    }

    /// Lenient preset: large budget and long timeout for thorough analysis
    pub fn lenient() -> Self {
        Self {
            token_budget: 100_000,
            request_timeout_secs: 300,
            ..Self::default()
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
