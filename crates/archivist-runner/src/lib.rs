//! Archivist Runner
//!
//! HTTP host for the Archivist entity operations. Each runner serves one shard
//! of the key space in-process and reaches the other shards over HTTP; the
//! shard table and health tracking live in [`registry::ShardRegistry`].
//!
//! # Routes
//!
//! - `POST /entity/archivist/{key}/prepare-documents`
//! - `POST /entity/archivist/{key}/analyze-document`
//! - `GET /health`

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod handlers;
pub mod registry;
pub mod telemetry;

use archivist_analyzer::DocumentAnalyzer;
use archivist_archive::ArchiveFetcher;
use archivist_domain::{ArchiveError, CompletionProvider, GraphClient, SubstrateError};
use archivist_graph::{GraphError, KnowledgeGraphUploader, ZepClient};
use archivist_ingest::{
    DocumentWorker, IngestionCoordinator, IngestionMetrics, LocalDispatcher, SharedMetrics,
};
use archivist_llm::{LlmError, OpenAiProvider};
use client::RunnerClient;
use config::RunnerConfig;
use handlers::{create_router, AppState};
use registry::ShardRegistry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Runner error
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Completion provider could not be set up
    #[error("Completion provider: {0}")]
    Llm(#[from] LlmError),

    /// Graph store client could not be set up
    #[error("Graph store: {0}")]
    Graph(#[from] GraphError),

    /// Archive fetcher could not be set up
    #[error("Archive fetcher: {0}")]
    Archive(#[from] ArchiveError),

    /// A remote shard could not be registered
    #[error("Shard table: {0}")]
    Shard(#[from] SubstrateError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Wire the pipeline and shard table for `config`
///
/// The local shard runs a [`DocumentWorker`] over `provider` and `graph`;
/// every other shard is reached through a [`RunnerClient`].
pub fn build_state<P, G>(config: &RunnerConfig, provider: P, graph: G) -> Result<AppState, RunnerError>
where
    P: CompletionProvider + 'static,
    G: GraphClient + 'static,
{
    config.validate()?;
    let metrics: SharedMetrics = IngestionMetrics::shared();

    let worker = DocumentWorker::new(
        DocumentAnalyzer::new(provider, config.analyzer.clone()),
        KnowledgeGraphUploader::new(graph, config.graph.clone()),
    )
    .with_metrics(Arc::clone(&metrics));
    let local = Arc::new(LocalDispatcher::new(Arc::new(worker)));

    let registry = Arc::new(ShardRegistry::new());
    for shard in &config.shards {
        match &shard.endpoint {
            Some(endpoint) if shard.id != config.runner_id => {
                registry.register_remote(
                    shard.id.clone(),
                    RunnerClient::new(endpoint, config.call_timeout())?,
                );
            }
            _ => registry.register_local(shard.id.clone(), local.clone()),
        }
    }

    let fetcher = ArchiveFetcher::new(config.ingest.download_timeout())?;
    let coordinator = IngestionCoordinator::new(fetcher, registry.clone(), config.ingest.clone())
        .with_metrics(Arc::clone(&metrics));

    Ok(AppState {
        runner_id: config.runner_id.clone(),
        coordinator: Arc::new(coordinator),
        local,
        registry,
        metrics,
    })
}

/// Start the runner HTTP server
///
/// Reads `OPENAI_API_KEY` and `ZEP_API_KEY` from the environment, builds the
/// pipeline, starts the health probe of remote shards and serves until the
/// listener fails.
pub async fn start_server(mut config: RunnerConfig) -> Result<(), RunnerError> {
    telemetry::init_tracing();

    info!("Starting Archivist runner {}", config.runner_id);
    info!("Bind address: {}", config.bind_addr());
    info!("Shards: {}", config.shards.len());
    info!("Fan-out concurrency: {}", config.ingest.concurrency);

    config.graph = config.graph.clone().with_env_overrides();

    let provider = OpenAiProvider::from_env(config.analyzer.model.clone())?;
    let graph = ZepClient::from_env(&config.graph)?;
    let state = build_state(&config, provider, graph)?;

    if state.registry.shard_count() > 1 {
        let registry = Arc::clone(&state.registry);
        let interval = config.health_check_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                registry.probe_remotes().await;
            }
        });
    } else {
        warn!("Single shard configured; every key is served locally");
    }

    let app = create_router(state);
    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Runner listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| RunnerError::Server(e.to_string()))?;

    Ok(())
}
