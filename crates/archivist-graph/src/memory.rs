//! In-memory graph store
//!
//! Used by tests and local runs. Clones share state, so a test can hand one
//! clone to the code under test and inspect the other.

use crate::error::GraphError;
use archivist_domain::{EpisodeRecord, GraphClient, GraphEpisode, GraphGroup, GroupCreation};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct State {
    groups: HashMap<String, GraphGroup>,
    episodes: Vec<GraphEpisode>,
    get_group_calls: usize,
    add_group_calls: usize,
    add_episode_calls: usize,
    failing_episodes: u32,
    failing_group_lookups: u32,
}

/// Graph store kept in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraph {
    state: Arc<Mutex<State>>,
    latency: Duration,
    next_id: Arc<AtomicU64>,
}

impl InMemoryGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`, making races between callers observable
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail the next `count` episode uploads
    pub fn fail_next_episodes(&self, count: u32) {
        self.state.lock().unwrap().failing_episodes = count;
    }

    /// Fail the next `count` group lookups
    pub fn fail_next_group_lookups(&self, count: u32) {
        self.state.lock().unwrap().failing_group_lookups = count;
    }

    /// Groups currently stored
    pub fn groups(&self) -> Vec<GraphGroup> {
        self.state.lock().unwrap().groups.values().cloned().collect()
    }

    /// Episodes stored so far
    pub fn episodes(&self) -> Vec<GraphEpisode> {
        self.state.lock().unwrap().episodes.clone()
    }

    /// Calls to `get_group`
    pub fn get_group_calls(&self) -> usize {
        self.state.lock().unwrap().get_group_calls
    }

    /// Calls to `add_group`
    pub fn add_group_calls(&self) -> usize {
        self.state.lock().unwrap().add_group_calls
    }

    /// Calls to `add_episode`, failed ones included
    pub fn add_episode_calls(&self) -> usize {
        self.state.lock().unwrap().add_episode_calls
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl GraphClient for InMemoryGraph {
    type Error = GraphError;

    async fn get_group(&self, group_id: &str) -> Result<Option<GraphGroup>, GraphError> {
        self.delay().await;
        let mut state = self.state.lock().unwrap();
        state.get_group_calls += 1;
        if state.failing_group_lookups > 0 {
            state.failing_group_lookups -= 1;
            return Err(GraphError::Unavailable("group lookup failed".to_string()));
        }
        Ok(state.groups.get(group_id).cloned())
    }

    async fn add_group(&self, group: &GraphGroup) -> Result<GroupCreation, GraphError> {
        self.delay().await;
        let mut state = self.state.lock().unwrap();
        state.add_group_calls += 1;
        if state.groups.contains_key(&group.group_id) {
            return Ok(GroupCreation::AlreadyExists);
        }
        state.groups.insert(group.group_id.clone(), group.clone());
        Ok(GroupCreation::Created(group.clone()))
    }

    async fn add_episode(&self, episode: &GraphEpisode) -> Result<EpisodeRecord, GraphError> {
        self.delay().await;
        let mut state = self.state.lock().unwrap();
        state.add_episode_calls += 1;
        if state.failing_episodes > 0 {
            state.failing_episodes -= 1;
            return Err(GraphError::Unavailable("episode rejected".to_string()));
        }
        if !state.groups.contains_key(&episode.group_id) {
            return Err(GraphError::Status {
                status: 404,
                body: format!("group {} not found", episode.group_id),
            });
        }
        state.episodes.push(episode.clone());

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(EpisodeRecord {
            uuid: Some(format!("episode-{}", id)),
            name: Some(format!("episode-{}", id)),
            content: episode.data.clone(),
            created_at: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_group_lifecycle() {
        let graph = InMemoryGraph::new();
        assert_eq!(graph.get_group("g").await.unwrap(), None);

        let created = graph.add_group(&GraphGroup::new("g")).await.unwrap();
        assert!(matches!(created, GroupCreation::Created(_)));

        let again = graph.add_group(&GraphGroup::new("g")).await.unwrap();
        assert_eq!(again, GroupCreation::AlreadyExists);
        assert_eq!(graph.groups().len(), 1);
    }

    #[tokio::test]
    async fn test_episode_requires_group() {
        let graph = InMemoryGraph::new();
        let err = graph
            .add_episode(&GraphEpisode::json("missing", "{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let graph = InMemoryGraph::new();
        graph.add_group(&GraphGroup::new("g")).await.unwrap();
        graph.fail_next_episodes(1);

        let episode = GraphEpisode::json("g", "{}");
        assert!(graph.add_episode(&episode).await.is_err());
        assert!(graph.add_episode(&episode).await.is_ok());
        assert_eq!(graph.add_episode_calls(), 2);
        assert_eq!(graph.episodes().len(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let graph = InMemoryGraph::new();
        let other = graph.clone();
        graph.add_group(&GraphGroup::new("g")).await.unwrap();
        assert_eq!(other.groups().len(), 1);
    }
}
