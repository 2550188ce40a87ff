use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::download::download_atomic;
use super::{FootageCandidate, FootageSource, VideoFile};
use crate::error::ProviderError;

const NAME: &str = "pexels";
const SEARCH_URL: &str = "https://api.pexels.com/videos/search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    id: u64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    video_files: Vec<PexelsFile>,
}

#[derive(Debug, Deserialize)]
struct PexelsFile {
    width: Option<u32>,
    height: Option<u32>,
    link: String,
}

pub fn parse_search(body: &str) -> Result<Vec<FootageCandidate>, serde_json::Error> {
    let parsed: SearchResponse = serde_json::from_str(body)?;
    Ok(parsed
        .videos
        .into_iter()
        .map(|v| FootageCandidate {
            id: v.id.to_string(),
            duration: v.duration,
            files: v
                .video_files
                .into_iter()
                .map(|f| VideoFile {
                    width: f.width.unwrap_or(0),
                    height: f.height.unwrap_or(0),
                    url: f.link,
                })
                .collect(),
        })
        .collect())
}

/// Primary stock source.
pub struct PexelsSource {
    client: Client,
    api_key: String,
}

impl PexelsSource {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl FootageSource for PexelsSource {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(&self, keyword: &str, per_page: usize) -> Result<Vec<FootageCandidate>, ProviderError> {
        let per_page = per_page.to_string();
        let response = self
            .client
            .get(SEARCH_URL)
            .timeout(Duration::from_secs(30))
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", keyword),
                ("per_page", per_page.as_str()),
                ("orientation", "landscape"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::transport(NAME, e))?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                provider: NAME.to_string(),
                status: response.status().as_u16(),
            });
        }
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::transport(NAME, e))?;
        parse_search(&body).map_err(|e| ProviderError::MalformedReply {
            provider: NAME.to_string(),
            detail: e.to_string(),
        })
    }

    async fn download(&self, url: &str, dest: &Path) -> anyhow::Result<()> {
        download_atomic(&self.client, url, dest).await.map(|_| ())
    }
}
