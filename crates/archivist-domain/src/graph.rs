//! Knowledge graph payloads

use serde::{Deserialize, Serialize};

/// A group that owns uploaded episodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphGroup {
    /// Stable group identifier
    pub group_id: String,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl GraphGroup {
    /// Group with only an id
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            name: None,
            description: None,
        }
    }
}

/// Outcome of a group creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupCreation {
    /// The group was created by this call
    Created(GraphGroup),
    /// Another caller created it first
    AlreadyExists,
}

/// Payload uploaded to the graph for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEpisode {
    /// Target group
    pub group_id: String,

    /// Episode type, always `"json"` for analyses
    #[serde(rename = "type")]
    pub kind: String,

    /// Serialized `{name, content, analysis}` record
    pub data: String,
}

impl GraphEpisode {
    /// JSON episode for the given group
    pub fn json(group_id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            kind: "json".to_string(),
            data: data.into(),
        }
    }
}

/// Acknowledgement returned by the graph for an accepted episode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRecord {
    /// Episode id assigned by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    /// Episode name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Stored content
    #[serde(default)]
    pub content: String,

    /// Creation timestamp as reported by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_wire_shape() {
        let episode = GraphEpisode::json("default", "{}");
        let json = serde_json::to_value(&episode).unwrap();
        assert_eq!(json["groupId"], "default");
        assert_eq!(json["type"], "json");
        assert_eq!(json["data"], "{}");
    }

    #[test]
    fn test_episode_record_tolerates_missing_fields() {
        let record: EpisodeRecord = serde_json::from_str(r#"{"content":"x"}"#).unwrap();
        assert_eq!(record.content, "x");
        assert!(record.uuid.is_none());
    }
}
