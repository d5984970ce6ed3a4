//! Integration tests for the KnowledgeGraphUploader

use archivist_domain::{GraphClient, GraphGroup, RetryPolicy};
use archivist_graph::{GraphConfig, InMemoryGraph, KnowledgeGraphUploader, UploadError};
use std::sync::Arc;
use std::time::Duration;

fn config() -> GraphConfig {
    GraphConfig {
        retry: RetryPolicy::new(3, Duration::from_millis(1)),
        ..GraphConfig::default()
    }
}

/// Serialized length of the `{name, content, analysis}` record
fn payload_len(name: &str, content: &str, analysis: &str) -> usize {
    serde_json::json!({ "name": name, "content": content, "analysis": analysis })
        .to_string()
        .chars()
        .count()
}

#[tokio::test]
async fn test_upload_creates_group_and_episode() {
    let graph = InMemoryGraph::new();
    let uploader = KnowledgeGraphUploader::new(graph.clone(), config());

    let record = uploader.upload("a.md", "# A", "About A").await.unwrap();

    assert!(record.uuid.is_some());
    assert_eq!(graph.groups()[0].group_id, "default");
    let episodes = graph.episodes();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].kind, "json");

    let data: serde_json::Value = serde_json::from_str(&episodes[0].data).unwrap();
    assert_eq!(data["name"], "a.md");
    assert_eq!(data["content"], "# A");
    assert_eq!(data["analysis"], "About A");
}

#[tokio::test]
async fn test_payload_at_limit_is_uploaded() {
    let graph = InMemoryGraph::new();
    let uploader = KnowledgeGraphUploader::new(graph.clone(), config());

    let overhead = payload_len("doc.txt", "", "summary");
    let content = "x".repeat(10_000 - overhead);
    assert_eq!(payload_len("doc.txt", &content, "summary"), 10_000);

    uploader.upload("doc.txt", &content, "summary").await.unwrap();
    assert_eq!(graph.add_episode_calls(), 1);
}

#[tokio::test]
async fn test_payload_over_limit_never_reaches_network() {
    let graph = InMemoryGraph::new();
    let uploader = KnowledgeGraphUploader::new(graph.clone(), config());

    let overhead = payload_len("doc.txt", "", "summary");
    let content = "x".repeat(10_001 - overhead);

    match uploader.upload("doc.txt", &content, "summary").await {
        Err(UploadError::TooLarge(e)) => {
            assert_eq!(e.size, 10_001);
            assert_eq!(e.limit, 10_000);
        }
        other => panic!("Expected TooLarge, got {:?}", other),
    }
    assert_eq!(graph.add_episode_calls(), 0);
    assert_eq!(graph.get_group_calls(), 0);
    assert_eq!(graph.add_group_calls(), 0);
}

#[tokio::test]
async fn test_size_counts_characters_not_bytes() {
    let graph = InMemoryGraph::new();
    let uploader = KnowledgeGraphUploader::new(graph.clone(), config());

    // 3 bytes per char, so bytes are far over the limit but chars are not
    let content = "€".repeat(9_000);
    assert!(uploader.upload("euro.txt", &content, "s").await.is_ok());
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let graph = InMemoryGraph::new();
    graph.fail_next_episodes(2);
    let uploader = KnowledgeGraphUploader::new(graph.clone(), config());

    uploader.upload("a.md", "a", "b").await.unwrap();
    assert_eq!(graph.add_episode_calls(), 3);
    assert_eq!(graph.episodes().len(), 1);
}

#[tokio::test]
async fn test_persistent_failure_is_zep_error() {
    let graph = InMemoryGraph::new();
    graph.fail_next_episodes(10);
    let uploader = KnowledgeGraphUploader::new(graph.clone(), config());

    match uploader.upload("a.md", "a", "b").await {
        Err(UploadError::Zep(e)) => assert_eq!(e.message, "Failed to call Zep"),
        other => panic!("Expected ZepError, got {:?}", other),
    }
    // First attempt plus 3 retries
    assert_eq!(graph.add_episode_calls(), 4);
}

#[tokio::test]
async fn test_existing_group_is_not_recreated() {
    let graph = InMemoryGraph::new();
    graph.add_group(&GraphGroup::new("default")).await.unwrap();
    let uploader = KnowledgeGraphUploader::new(graph.clone(), config());

    uploader.upload("a.md", "a", "b").await.unwrap();
    uploader.upload("b.md", "a", "b").await.unwrap();

    assert_eq!(graph.get_group_calls(), 1);
    assert_eq!(graph.add_group_calls(), 1);
}

#[tokio::test]
async fn test_failed_lookup_falls_through_to_create() {
    let graph = InMemoryGraph::new();
    graph.fail_next_group_lookups(1);
    let uploader = KnowledgeGraphUploader::new(graph.clone(), config());

    uploader.ensure_group().await.unwrap();
    assert_eq!(graph.groups().len(), 1);
}

#[tokio::test]
async fn test_concurrent_first_use_shares_one_ensure() {
    let graph = InMemoryGraph::new().with_latency(Duration::from_millis(20));
    let uploader = Arc::new(KnowledgeGraphUploader::new(graph.clone(), config()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let uploader = Arc::clone(&uploader);
            tokio::spawn(async move {
                uploader
                    .upload(&format!("doc-{}.md", i), "content", "analysis")
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(graph.groups().len(), 1);
    assert_eq!(graph.get_group_calls(), 1);
    assert_eq!(graph.add_group_calls(), 1);
    assert_eq!(graph.episodes().len(), 8);
}

#[tokio::test]
async fn test_two_uploaders_racing_on_one_group() {
    let graph = InMemoryGraph::new().with_latency(Duration::from_millis(20));
    let first = KnowledgeGraphUploader::new(graph.clone(), config());
    let second = KnowledgeGraphUploader::new(graph.clone(), config());

    let (a, b) = tokio::join!(first.ensure_group(), second.ensure_group());
    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(graph.groups().len(), 1);
}
