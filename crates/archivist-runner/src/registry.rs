//! Shard registry routing entity keys to runners.
//!
//! Every key is owned by exactly one shard, chosen by a SHA-256 hash of the
//! key over the shard table sorted by id. Ownership only moves when the table
//! changes. A key whose owner is not healthy is refused with
//! `SubstrateError::NoRunner`, which callers treat as transient.

use crate::client::RunnerClient;
use archivist_domain::{
    AnalyzeDocumentRequest, AnalyzeDocumentResponse, AnalyzeError, DocumentDispatcher,
    InvokeError, SubstrateError,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Registry error
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Shard not found
    #[error("Shard not found: {0}")]
    ShardNotFound(String),
}

/// Health status of a shard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Shard is healthy and accepting calls
    Healthy,
    /// Shard is unhealthy; its keys are refused
    Unhealthy,
}

impl HealthStatus {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

/// Public view of one shard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardInfo {
    /// Shard ID
    pub id: String,

    /// HTTP endpoint; `None` for the shard served in this process
    pub endpoint: Option<String>,

    /// Health status: "healthy" or "unhealthy"
    pub health: String,
}

#[derive(Clone)]
enum Target {
    Local(Arc<dyn DocumentDispatcher>),
    Remote(Arc<RunnerClient>),
}

impl Target {
    fn dispatcher(&self) -> Arc<dyn DocumentDispatcher> {
        match self {
            Target::Local(dispatcher) => Arc::clone(dispatcher),
            Target::Remote(client) => Arc::clone(client) as Arc<dyn DocumentDispatcher>,
        }
    }
}

#[derive(Clone)]
struct Shard {
    id: String,
    target: Target,
    health: HealthStatus,
}

impl Shard {
    fn info(&self) -> ShardInfo {
        ShardInfo {
            id: self.id.clone(),
            endpoint: match &self.target {
                Target::Local(_) => None,
                Target::Remote(client) => Some(client.endpoint().to_string()),
            },
            health: self.health.as_str().to_string(),
        }
    }
}

/// Index of the shard owning `key` in a table of `count` shards
pub fn shard_index(key: &str, count: usize) -> usize {
    let digest = Sha256::digest(key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % count.max(1) as u64) as usize
}

/// Registry of the shards this runner can dispatch to
pub struct ShardRegistry {
    shards: RwLock<Vec<Shard>>,
}

impl ShardRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            shards: RwLock::new(Vec::new()),
        }
    }

    /// Register the shard served in this process
    pub fn register_local(&self, id: impl Into<String>, dispatcher: Arc<dyn DocumentDispatcher>) {
        self.insert(id.into(), Target::Local(dispatcher));
    }

    /// Register a shard served by another runner
    pub fn register_remote(&self, id: impl Into<String>, client: RunnerClient) {
        self.insert(id.into(), Target::Remote(Arc::new(client)));
    }

    fn insert(&self, id: String, target: Target) {
        let mut shards = self.shards.write().unwrap_or_else(PoisonError::into_inner);
        shards.retain(|shard| shard.id != id);
        shards.push(Shard {
            id,
            target,
            health: HealthStatus::Healthy,
        });
        shards.sort_by(|a, b| a.id.cmp(&b.id));
    }

    /// Id of the shard owning `key`, healthy or not
    pub fn owner_of(&self, key: &str) -> Option<String> {
        let shards = self.shards.read().unwrap_or_else(PoisonError::into_inner);
        if shards.is_empty() {
            return None;
        }
        Some(shards[shard_index(key, shards.len())].id.clone())
    }

    /// Dispatcher for the shard owning `key`
    pub fn route(&self, key: &str) -> Result<Arc<dyn DocumentDispatcher>, SubstrateError> {
        let shards = self.shards.read().unwrap_or_else(PoisonError::into_inner);
        if shards.is_empty() {
            return Err(SubstrateError::NoRunner(key.to_string()));
        }

        let shard = &shards[shard_index(key, shards.len())];
        if shard.health != HealthStatus::Healthy {
            warn!("Shard {} owning '{}' is {}", shard.id, key, shard.health.as_str());
            return Err(SubstrateError::NoRunner(key.to_string()));
        }
        debug!("Routing '{}' to shard {}", key, shard.id);
        Ok(shard.target.dispatcher())
    }

    /// Update health status of a shard
    pub fn update_health(&self, id: &str, health: HealthStatus) -> Result<(), RegistryError> {
        let mut shards = self.shards.write().unwrap_or_else(PoisonError::into_inner);
        let shard = shards
            .iter_mut()
            .find(|shard| shard.id == id)
            .ok_or_else(|| RegistryError::ShardNotFound(id.to_string()))?;

        if shard.health != health {
            info!("Shard {} is now {}", id, health.as_str());
        }
        shard.health = health;
        Ok(())
    }

    /// Probe every remote shard and record its health
    pub async fn probe_remotes(&self) {
        let remotes: Vec<(String, Arc<RunnerClient>)> = {
            let shards = self.shards.read().unwrap_or_else(PoisonError::into_inner);
            shards
                .iter()
                .filter_map(|shard| match &shard.target {
                    Target::Remote(client) => Some((shard.id.clone(), Arc::clone(client))),
                    Target::Local(_) => None,
                })
                .collect()
        };

        for (id, client) in remotes {
            let health = match client.health().await {
                Ok(_) => HealthStatus::Healthy,
                Err(e) => {
                    warn!("Health probe of shard {} failed: {}", id, e);
                    HealthStatus::Unhealthy
                }
            };
            // The shard may have been replaced while probing
            let _ = self.update_health(&id, health);
        }
    }

    /// All shards in routing order
    pub fn all_shards(&self) -> Vec<ShardInfo> {
        let shards = self.shards.read().unwrap_or_else(PoisonError::into_inner);
        shards.iter().map(Shard::info).collect()
    }

    /// Number of healthy shards
    pub fn healthy_count(&self) -> usize {
        let shards = self.shards.read().unwrap_or_else(PoisonError::into_inner);
        shards
            .iter()
            .filter(|shard| shard.health == HealthStatus::Healthy)
            .count()
    }

    /// Get shard count
    pub fn shard_count(&self) -> usize {
        self.shards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for ShardRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentDispatcher for ShardRegistry {
    async fn analyze_document(
        &self,
        key: &str,
        request: AnalyzeDocumentRequest,
    ) -> Result<AnalyzeDocumentResponse, InvokeError<AnalyzeError>> {
        let dispatcher = self.route(key)?;
        dispatcher.analyze_document(key, request).await
    }
}
