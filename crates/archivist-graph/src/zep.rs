//! Zep graph store client
//!
//! Speaks the subset of the Zep v2 HTTP API the uploader needs: group lookup,
//! group creation and adding data to a group's graph. The API key is sent as
//! `Authorization: Api-Key <key>` and kept in a [`SecretString`].

use crate::config::GraphConfig;
use crate::error::GraphError;
use archivist_domain::{EpisodeRecord, GraphClient, GraphEpisode, GraphGroup, GroupCreation};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "ZEP_API_KEY";

/// HTTP client for a Zep-compatible graph store
pub struct ZepClient {
    base_url: String,
    api_key: SecretString,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct CreateGroupBody<'a> {
    group_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Deserialize)]
struct GroupResponse {
    group_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl From<GroupResponse> for GraphGroup {
    fn from(g: GroupResponse) -> Self {
        GraphGroup {
            group_id: g.group_id,
            name: g.name,
            description: g.description,
        }
    }
}

#[derive(Serialize)]
struct AddDataBody<'a> {
    group_id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct EpisodeResponse {
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<EpisodeResponse> for EpisodeRecord {
    fn from(e: EpisodeResponse) -> Self {
        EpisodeRecord {
            uuid: e.uuid,
            name: e.name,
            content: e.content,
            created_at: e.created_at,
        }
    }
}

impl ZepClient {
    /// Create a client for the store described by `config`
    pub fn new(config: &GraphConfig, api_key: SecretString) -> Result<Self, GraphError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| GraphError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    /// Create a client reading the API key from `ZEP_API_KEY`
    pub fn from_env(config: &GraphConfig) -> Result<Self, GraphError> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| GraphError::Configuration(format!("{} is not set", API_KEY_ENV)))?;
        Self::new(config, SecretString::from(api_key))
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Api-Key {}", self.api_key.expose_secret()),
            )
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, GraphError> {
        builder
            .send()
            .await
            .map_err(|e| GraphError::Http(e.to_string()))
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T, GraphError> {
        response
            .json::<T>()
            .await
            .map_err(|e| GraphError::InvalidResponse(e.to_string()))
    }
}

async fn status_error(response: reqwest::Response) -> GraphError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    GraphError::Status { status, body }
}

/// Whether a failed create means someone else already made the group
fn is_already_exists(status: u16, body: &str) -> bool {
    status == 409 || (status == 400 && body.to_ascii_lowercase().contains("already exists"))
}

#[async_trait]
impl GraphClient for ZepClient {
    type Error = GraphError;

    async fn get_group(&self, group_id: &str) -> Result<Option<GraphGroup>, GraphError> {
        let response = self
            .send(self.request(reqwest::Method::GET, &format!("/groups/{}", group_id)))
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let group: GroupResponse = Self::parse(response).await?;
        Ok(Some(group.into()))
    }

    async fn add_group(&self, group: &GraphGroup) -> Result<GroupCreation, GraphError> {
        let body = CreateGroupBody {
            group_id: &group.group_id,
            name: group.name.as_deref(),
            description: group.description.as_deref(),
        };
        let response = self
            .send(self.request(reqwest::Method::POST, "/groups").json(&body))
            .await?;

        if response.status().is_success() {
            let created: GroupResponse = Self::parse(response).await?;
            debug!("Created graph group {}", created.group_id);
            return Ok(GroupCreation::Created(created.into()));
        }

        match status_error(response).await {
            GraphError::Status { status, body } if is_already_exists(status, &body) => {
                Ok(GroupCreation::AlreadyExists)
            }
            other => Err(other),
        }
    }

    async fn add_episode(&self, episode: &GraphEpisode) -> Result<EpisodeRecord, GraphError> {
        let body = AddDataBody {
            group_id: &episode.group_id,
            kind: &episode.kind,
            data: &episode.data,
        };
        let response = self
            .send(self.request(reqwest::Method::POST, "/graph").json(&body))
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        let record: EpisodeResponse = Self::parse(response).await?;
        Ok(record.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ZepClient {
        let config = GraphConfig {
            base_url: "http://localhost:8000/api/v2/".to_string(),
            ..GraphConfig::default()
        };
        ZepClient::new(&config, SecretString::from("z-test".to_string())).unwrap()
    }

    #[test]
    fn test_base_url_trimmed() {
        assert_eq!(client().base_url(), "http://localhost:8000/api/v2");
    }

    #[test]
    fn test_auth_header() {
        let request = client()
            .request(reqwest::Method::GET, "/groups/default")
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:8000/api/v2/groups/default");
        assert_eq!(
            request.headers()[reqwest::header::AUTHORIZATION],
            "Api-Key z-test"
        );
    }

    #[test]
    fn test_add_data_body_shape() {
        let body = AddDataBody {
            group_id: "default",
            kind: "json",
            data: "{}",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["group_id"], "default");
        assert_eq!(json["type"], "json");
    }

    #[test]
    fn test_episode_response_mapping() {
        let raw = r#"{"uuid":"e-1","name":"ep","content":"{}","created_at":"2024-01-01T00:00:00Z","source":"json"}"#;
        let record: EpisodeRecord = serde_json::from_str::<EpisodeResponse>(raw).unwrap().into();
        assert_eq!(record.uuid.as_deref(), Some("e-1"));
        assert_eq!(record.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_already_exists_detection() {
        assert!(is_already_exists(409, ""));
        assert!(is_already_exists(400, "Group Already Exists"));
        assert!(!is_already_exists(400, "bad request"));
        assert!(!is_already_exists(500, "already exists"));
    }

    #[tokio::test]
    async fn test_unreachable_store_is_http_error() {
        let config = GraphConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..GraphConfig::default()
        };
        let client = ZepClient::new(&config, SecretString::from("k".to_string())).unwrap();
        let err = client.get_group("default").await.unwrap_err();
        assert!(matches!(err, GraphError::Http(_)));
    }
}
