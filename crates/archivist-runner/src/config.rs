//! Configuration file parsing for a runner.
//!
//! Loads the bind address, this runner's shard id, the shard table and the
//! nested pipeline settings from TOML.

use archivist_analyzer::AnalyzerConfig;
use archivist_graph::GraphConfig;
use archivist_ingest::IngestConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Runner configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Runner configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,

    /// Shard id served in this process
    pub runner_id: String,

    /// Timeout for calls to remote runners (default: 600 seconds)
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Interval between health probes of remote runners (default: 30 seconds)
    #[serde(default = "default_health_interval")]
    pub health_check_interval_secs: u64,

    /// Every shard of the cluster, this runner included
    #[serde(default)]
    pub shards: Vec<ShardConfig>,

    /// Fan-out settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Completion settings
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Graph store settings
    #[serde(default)]
    pub graph: GraphConfig,
}

/// One shard of the cluster
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ShardConfig {
    /// Shard identifier (e.g., "runner-0")
    pub id: String,

    /// HTTP endpoint (e.g., "http://10.0.0.5:8080"); unused for the local shard
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_call_timeout() -> u64 {
    600
}

fn default_health_interval() -> u64 {
    30
}

impl RunnerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: RunnerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Single runner serving every key in-process
    pub fn standalone() -> Self {
        RunnerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            runner_id: "runner-0".to_string(),
            call_timeout_secs: default_call_timeout(),
            health_check_interval_secs: default_health_interval(),
            shards: vec![ShardConfig {
                id: "runner-0".to_string(),
                endpoint: None,
            }],
            ingest: IngestConfig::default(),
            analyzer: AnalyzerConfig::default(),
            graph: GraphConfig::default(),
        }
    }

    /// Check the shard table and the nested settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runner_id.is_empty() {
            return Err(ConfigError::Invalid("runner_id must not be empty".to_string()));
        }
        if !self.shards.iter().any(|s| s.id == self.runner_id) {
            return Err(ConfigError::Invalid(format!(
                "runner_id '{}' is not listed in shards",
                self.runner_id
            )));
        }
        for (i, shard) in self.shards.iter().enumerate() {
            if self.shards[..i].iter().any(|s| s.id == shard.id) {
                return Err(ConfigError::Invalid(format!("duplicate shard id '{}'", shard.id)));
            }
            if shard.id != self.runner_id && shard.endpoint.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "remote shard '{}' has no endpoint",
                    shard.id
                )));
            }
        }
        if self.call_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "call_timeout_secs must be greater than 0".to_string(),
            ));
        }
        self.ingest.validate().map_err(ConfigError::Invalid)?;
        self.analyzer.validate().map_err(ConfigError::Invalid)?;
        self.graph.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }

    /// Timeout for calls to remote runners
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Interval between health probes
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }
}
