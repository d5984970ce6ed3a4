//! Knowledge graph uploader

use crate::config::GraphConfig;
use crate::error::UploadError;
use archivist_domain::{
    EpisodeRecord, GraphClient, GraphEpisode, GraphGroup, GroupCreation, TooLargeError, ZepError,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

/// Record stored in the graph for each analyzed document
#[derive(Debug, Serialize)]
struct AnalysisPayload<'a> {
    name: &'a str,
    content: &'a str,
    analysis: &'a str,
}

/// Uploads document analyses into one graph group
///
/// The group is ensured on first use. Concurrent first uploads share a single
/// in-flight ensure; a failed ensure is attempted again by the next upload.
pub struct KnowledgeGraphUploader<G>
where
    G: GraphClient,
{
    client: Arc<G>,
    config: GraphConfig,
    group_ready: OnceCell<()>,
}

impl<G> KnowledgeGraphUploader<G>
where
    G: GraphClient,
{
    /// Create a new uploader
    pub fn new(client: G, config: GraphConfig) -> Self {
        Self::from_shared(Arc::new(client), config)
    }

    /// Create an uploader around an already shared client
    pub fn from_shared(client: Arc<G>, config: GraphConfig) -> Self {
        Self {
            client,
            config,
            group_ready: OnceCell::new(),
        }
    }

    /// Group episodes are uploaded to
    pub fn group_id(&self) -> &str {
        &self.config.group_id
    }

    /// Upload the analysis of one document
    ///
    /// # Errors
    ///
    /// - `TooLarge` when the serialized record exceeds the payload limit; no
    ///   request is made and nothing is retried
    /// - `Zep` when the store keeps failing after the retry budget
    #[instrument(skip_all, fields(document = %document_name))]
    pub async fn upload(
        &self,
        document_name: &str,
        content: &str,
        analysis: &str,
    ) -> Result<EpisodeRecord, UploadError> {
        let payload = serde_json::to_string(&AnalysisPayload {
            name: document_name,
            content,
            analysis,
        })
        .map_err(|e| ZepError::new("Failed to serialize analysis").with_cause(e))?;

        let size = payload.chars().count();
        if size > self.config.max_payload_chars {
            return Err(TooLargeError {
                size,
                limit: self.config.max_payload_chars,
            }
            .into());
        }

        let episode = GraphEpisode::json(self.config.group_id.clone(), payload);
        let episode = &episode;
        let record = self
            .config
            .retry
            .run(move |attempt| async move {
                let result = self.try_upload(episode).await;
                if let Err(e) = &result {
                    warn!("Upload attempt {} failed: {}", attempt + 1, e);
                }
                result
            })
            .await?;

        info!(
            "Uploaded '{}' as {}",
            document_name,
            record.uuid.as_deref().unwrap_or("<unnamed>")
        );
        Ok(record)
    }

    async fn try_upload(&self, episode: &GraphEpisode) -> Result<EpisodeRecord, ZepError> {
        self.ensure_group().await?;
        self.client
            .add_episode(episode)
            .await
            .map_err(|e| ZepError::new("Failed to call Zep").with_cause(e))
    }

    /// Make sure the target group exists
    ///
    /// A lookup failure falls through to creation; "already exists" on
    /// creation counts as success.
    pub async fn ensure_group(&self) -> Result<(), ZepError> {
        self.group_ready
            .get_or_try_init(|| async {
                let group_id = &self.config.group_id;
                match self.client.get_group(group_id).await {
                    Ok(Some(_)) => {
                        debug!("Graph group {} exists", group_id);
                        return Ok(());
                    }
                    Ok(None) => debug!("Graph group {} not found, creating", group_id),
                    Err(e) => debug!("Graph group lookup failed ({}), creating", e),
                }

                match self.client.add_group(&GraphGroup::new(group_id.clone())).await {
                    Ok(GroupCreation::Created(_)) => {
                        info!("Created graph group {}", group_id);
                        Ok(())
                    }
                    Ok(GroupCreation::AlreadyExists) => Ok(()),
                    Err(e) => Err(ZepError::new("Failed to call Zep").with_cause(e)),
                }
            })
            .await
            .map(|_| ())
    }
}
