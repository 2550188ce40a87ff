use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::LOCATION;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::metadata::VideoMetadata;

const YOUTUBE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/youtube/v3";

#[async_trait]
pub trait Publisher: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the public URL of the published video.
    async fn publish(&self, video: &Path, thumbnail: Option<&Path>, metadata: &VideoMetadata) -> anyhow::Result<String>;
}

pub fn upload_body(metadata: &VideoMetadata, privacy: &str, category: &str) -> Value {
    json!({
        "snippet": {
            "title": metadata.primary_title(),
            "description": metadata.description,
            "tags": metadata.tags,
            "categoryId": category,
        },
        "status": {
            "privacyStatus": privacy,
            "selfDeclaredMadeForKids": false,
        },
    })
}

/// YouTube Data API resumable upload with a pre-issued OAuth access token.
pub struct YouTubePublisher {
    client: Client,
    access_token: String,
    privacy: String,
    category: String,
    base_url: String,
}

impl YouTubePublisher {
    pub fn new(client: Client, access_token: String, privacy: String, category: String) -> Self {
        Self {
            client,
            access_token,
            privacy,
            category,
            base_url: YOUTUBE_UPLOAD_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn open_session(&self, metadata: &VideoMetadata, length: u64) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}/videos", self.base_url))
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&self.access_token)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", length.to_string())
            .json(&upload_body(metadata, &self.privacy, &self.category))
            .timeout(Duration::from_secs(60))
            .send()
            .await?
            .error_for_status()?;

        let session = response
            .headers()
            .get(LOCATION)
            .context("upload session response had no Location header")?
            .to_str()?
            .to_string();
        Ok(session)
    }

    async fn set_thumbnail(&self, video_id: &str, thumbnail: &Path) -> anyhow::Result<()> {
        let bytes = tokio::fs::read(thumbnail).await?;
        self.client
            .post(format!("{}/thumbnails/set", self.base_url))
            .query(&[("videoId", video_id)])
            .bearer_auth(&self.access_token)
            .header("Content-Type", "image/png")
            .body(bytes)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Publisher for YouTubePublisher {
    fn name(&self) -> &str {
        "youtube"
    }

    async fn publish(&self, video: &Path, thumbnail: Option<&Path>, metadata: &VideoMetadata) -> anyhow::Result<String> {
        let bytes = tokio::fs::read(video)
            .await
            .with_context(|| format!("reading {}", video.display()))?;
        info!("Uploading {} ({} bytes) to YouTube", video.display(), bytes.len());

        let session = self.open_session(metadata, bytes.len() as u64).await?;
        let response: Value = self
            .client
            .put(&session)
            .bearer_auth(&self.access_token)
            .header("Content-Type", "video/mp4")
            .body(bytes)
            .timeout(Duration::from_secs(3600))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let video_id = response["id"]
            .as_str()
            .context("upload response carried no video id")?
            .to_string();
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        info!("Video uploaded: {}", url);

        if let Some(thumbnail) = thumbnail {
            match self.set_thumbnail(&video_id, thumbnail).await {
                Ok(()) => info!("Thumbnail uploaded"),
                Err(e) => warn!("Thumbnail upload failed (channel may need verification): {:#}", e),
            }
        }
        Ok(url)
    }
}
