//! HTTP request handlers for a runner.
//!
//! Serves the two Archivist entity operations and a health check using axum.
//! Domain failures are answered with `422` and a tagged JSON error so the
//! caller can rebuild the typed error; escalations and handler failures are
//! answered with `500`.

use crate::registry::{ShardInfo, ShardRegistry};
use archivist_domain::{
    AnalyzeDocumentRequest, AnalyzeDocumentResponse, AnalyzeError, ArchiveRequest,
    DocumentDispatcher, InvokeError, PrepareDocumentsResponse, PrepareError,
};
use archivist_ingest::{metrics, IngestionCoordinator, SharedMetrics};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

/// Header carrying the caller's request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Shard id served by this process
    pub runner_id: String,
    /// Handles `PrepareDocuments`
    pub coordinator: Arc<IngestionCoordinator>,
    /// Handles `AnalyzeDocument` in this process
    pub local: Arc<dyn DocumentDispatcher>,
    /// Shard table used for the fan-out
    pub registry: Arc<ShardRegistry>,
    /// Counters reported by the health check
    pub metrics: SharedMetrics,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Shard id of the answering runner
    pub runner_id: String,
    /// Total number of shards
    pub shard_count: usize,
    /// Number of healthy shards
    pub healthy_shards: usize,
    /// Shard table
    pub shards: Vec<ShardInfo>,
    /// Ingestion metrics summary
    pub metrics: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse<E> {
    /// Typed error
    pub error: E,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// `PrepareDocuments` failed
    Prepare(PrepareError),
    /// `AnalyzeDocument` failed in the handler
    Analyze(AnalyzeError),
    /// The handler did not produce a typed reply
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Prepare(e @ PrepareError::Archive(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(ErrorResponse { error: e })).into_response()
            }
            AppError::Prepare(e @ PrepareError::ClusterProblem(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e })).into_response()
            }
            AppError::Analyze(e) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(ErrorResponse { error: e })).into_response()
            }
            AppError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse { error: message }),
            )
                .into_response(),
        }
    }
}

impl From<PrepareError> for AppError {
    fn from(e: PrepareError) -> Self {
        AppError::Prepare(e)
    }
}

impl From<InvokeError<AnalyzeError>> for AppError {
    fn from(e: InvokeError<AnalyzeError>) -> Self {
        match e {
            InvokeError::Rpc(e) => AppError::Analyze(e),
            InvokeError::Substrate(e) => AppError::Internal(e.to_string()),
        }
    }
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string())
}

/// POST /entity/archivist/{key}/prepare-documents - Ingest one archive
async fn prepare_documents(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ArchiveRequest>,
) -> Result<Json<PrepareDocumentsResponse>, AppError> {
    let span = info_span!("prepare_documents", request_id = %request_id(&headers));
    let response = state
        .coordinator
        .prepare_documents(&key, request)
        .instrument(span)
        .await?;
    Ok(Json(response))
}

/// POST /entity/archivist/{key}/analyze-document - Analyze one document
async fn analyze_document(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    Json(request): Json<AnalyzeDocumentRequest>,
) -> Result<Json<AnalyzeDocumentResponse>, AppError> {
    let span = info_span!("analyze_document", request_id = %request_id(&headers));
    let result = state
        .local
        .analyze_document(&key, request)
        .instrument(span)
        .await;

    match result {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            if let InvokeError::Substrate(failure) = &e {
                error!("Document handler failed for '{}': {}", key, failure);
            }
            Err(e.into())
        }
    }
}

/// GET /health - Runner health check
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    let shards = state.registry.all_shards();
    let healthy_shards = state.registry.healthy_count();

    let status = if healthy_shards == 0 {
        "unhealthy"
    } else if healthy_shards < shards.len() {
        "degraded"
    } else {
        "healthy"
    };

    Json(HealthCheckResponse {
        status: status.to_string(),
        runner_id: state.runner_id.clone(),
        shard_count: shards.len(),
        healthy_shards,
        shards,
        metrics: metrics::snapshot(&state.metrics).summary(),
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route(
            "/entity/archivist/:key/prepare-documents",
            post(prepare_documents),
        )
        .route(
            "/entity/archivist/:key/analyze-document",
            post(analyze_document),
        )
        .route("/health", get(health_check))
        .with_state(state)
}
