//! Integration tests for the runner service

use archivist_domain::{
    resolve, AnalyzeDocumentRequest, ArchiveErrorKind, ArchiveRequest, ArchivistClient,
    DocumentDispatcher, InvokeError, PrepareError, Resolution,
};
use archivist_graph::InMemoryGraph;
use archivist_llm::MockProvider;
use archivist_runner::{
    build_state,
    client::RunnerClient,
    config::{RunnerConfig, ShardConfig},
    handlers::{create_router, AppState, HealthCheckResponse},
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt; // for oneshot
use zip::write::SimpleFileOptions;

const SUMMARY: &str = "A concise summary.";

fn build_zip(dir: &Path, files: &[(&str, &str)]) -> PathBuf {
    let path = dir.join("bundle.zip");
    let mut zip = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
    for (name, content) in files {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}

fn file_url(path: &Path) -> String {
    url::Url::from_file_path(path).unwrap().to_string()
}

/// Helper to create a standalone runner over in-memory collaborators
fn create_test_state(provider: MockProvider, graph: InMemoryGraph) -> AppState {
    build_state(&RunnerConfig::standalone(), provider, graph).unwrap()
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn spawn_runner(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = create_router(create_test_state(MockProvider::new(SUMMARY), InMemoryGraph::new()));

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: HealthCheckResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.runner_id, "runner-0");
    assert_eq!(health.shard_count, 1);
    assert_eq!(health.healthy_shards, 1);
    assert!(health.metrics.contains("Ingestion Metrics Summary"));
}

#[tokio::test]
async fn test_prepare_documents_endpoint() {
    let dir = TempDir::new().unwrap();
    let archive = build_zip(dir.path(), &[("a.md", "alpha"), ("b.md", "beta"), ("c/d.md", "delta")]);
    let graph = InMemoryGraph::new();
    let app = create_router(create_test_state(MockProvider::new(SUMMARY), graph.clone()));

    let body = serde_json::json!({ "archiveUrl": file_url(&archive) }).to_string();
    let response = app
        .oneshot(post_json("/entity/archivist/batch-1/prepare-documents", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!({ "fileCount": 3 }));
    assert_eq!(graph.episodes().len(), 3);
}

#[tokio::test]
async fn test_prepare_unsupported_format_is_422() {
    let app = create_router(create_test_state(MockProvider::new(SUMMARY), InMemoryGraph::new()));

    let body = r#"{"archiveUrl": "https://example.com/bundle.rar"}"#.to_string();
    let response = app
        .oneshot(post_json("/entity/archivist/batch-1/prepare-documents", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = json_body(response).await;
    assert_eq!(json["error"]["_tag"], "ArchiveError");
    assert_eq!(json["error"]["kind"], "unsupported_format");
}

#[tokio::test]
async fn test_analyze_document_endpoint() {
    let graph = InMemoryGraph::new();
    let app = create_router(create_test_state(MockProvider::new(SUMMARY), graph.clone()));

    let body = r#"{"name": "notes/today.md", "content": "Met with the team."}"#.to_string();
    let response = app
        .oneshot(post_json(
            "/entity/archivist/notes%2Ftoday.md/analyze-document",
            body,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["analysis"], SUMMARY);
    assert_eq!(graph.episodes().len(), 1);
}

#[tokio::test]
async fn test_analyze_ai_failure_is_422() {
    let provider = MockProvider::new(SUMMARY);
    provider.add_error("unlucky");
    let app = create_router(create_test_state(provider, InMemoryGraph::new()));

    let body = r#"{"name": "x.md", "content": "an unlucky document"}"#.to_string();
    let response = app
        .oneshot(post_json("/entity/archivist/x.md/analyze-document", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["error"]["_tag"], "AiError");
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let app = create_router(create_test_state(MockProvider::new(SUMMARY), InMemoryGraph::new()));
    let response = app
        .oneshot(post_json(
            "/entity/archivist/k/analyze-document",
            r#"{"title": 1}"#.to_string(),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_client_round_trip_over_http() {
    let graph = InMemoryGraph::new();
    let base = spawn_runner(create_router(create_test_state(
        MockProvider::new(SUMMARY),
        graph.clone(),
    )))
    .await;
    let client = RunnerClient::new(&base, Duration::from_secs(10)).unwrap();

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "healthy");

    let response = client
        .analyze_document("docs/a b.md", AnalyzeDocumentRequest::new("docs/a b.md", "text"))
        .await
        .unwrap();
    assert_eq!(response.analysis, SUMMARY);
    assert_eq!(graph.episodes().len(), 1);
}

#[tokio::test]
async fn test_client_rebuilds_typed_errors() {
    let provider = MockProvider::new(SUMMARY);
    provider.add_error("poison");
    let base = spawn_runner(create_router(create_test_state(provider, InMemoryGraph::new()))).await;
    let client = RunnerClient::new(&base, Duration::from_secs(10)).unwrap();

    let err = client
        .prepare_documents("batch", ArchiveRequest::new("https://example.com/x.rar"))
        .await
        .unwrap_err();
    match &err {
        InvokeError::Rpc(PrepareError::Archive(e)) => {
            assert_eq!(e.kind, ArchiveErrorKind::UnsupportedFormat)
        }
        other => panic!("expected archive error, got {:?}", other),
    }
    assert!(!err.is_retryable());

    let err = client
        .analyze_document("p.md", AnalyzeDocumentRequest::new("p.md", "poison"))
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::Rpc(_)));

    // A typed domain failure degrades to a soft result
    match resolve::<(), _>(Err(err)).unwrap() {
        Resolution::Soft(soft) => assert_eq!(soft.tag, "AiError"),
        other => panic!("expected soft result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fan_out_across_two_runners() {
    let remote_graph = InMemoryGraph::new();
    let remote_config = RunnerConfig {
        runner_id: "runner-b".to_string(),
        shards: vec![
            ShardConfig {
                id: "runner-a".to_string(),
                endpoint: Some("http://127.0.0.1:1".to_string()),
            },
            ShardConfig {
                id: "runner-b".to_string(),
                endpoint: None,
            },
        ],
        ..RunnerConfig::standalone()
    };
    let remote_state =
        build_state(&remote_config, MockProvider::new(SUMMARY), remote_graph.clone()).unwrap();
    let remote_url = spawn_runner(create_router(remote_state)).await;

    let local_graph = InMemoryGraph::new();
    let local_config = RunnerConfig {
        runner_id: "runner-a".to_string(),
        shards: vec![
            ShardConfig {
                id: "runner-a".to_string(),
                endpoint: None,
            },
            ShardConfig {
                id: "runner-b".to_string(),
                endpoint: Some(remote_url),
            },
        ],
        ..RunnerConfig::standalone()
    };
    let local_state =
        build_state(&local_config, MockProvider::new(SUMMARY), local_graph.clone()).unwrap();
    let registry = local_state.registry.clone();

    let names: Vec<String> = (0..12).map(|i| format!("doc-{}.md", i)).collect();
    let files: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "body")).collect();
    let dir = TempDir::new().unwrap();
    let archive = build_zip(dir.path(), &files);

    let response = local_state
        .coordinator
        .prepare_documents("batch", ArchiveRequest::new(file_url(&archive)))
        .await
        .unwrap();
    assert_eq!(response.file_count, 12);

    let expected_remote = names
        .iter()
        .filter(|n| registry.owner_of(n).as_deref() == Some("runner-b"))
        .count();
    assert_eq!(remote_graph.episodes().len(), expected_remote);
    assert_eq!(local_graph.episodes().len(), 12 - expected_remote);
}
