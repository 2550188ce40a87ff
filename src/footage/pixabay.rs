use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::download::download_atomic;
use super::{FootageCandidate, FootageSource, VideoFile};
use crate::error::ProviderError;

const NAME: &str = "pixabay";
const SEARCH_URL: &str = "https://pixabay.com/api/videos/";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<PixabayHit>,
}

#[derive(Debug, Deserialize)]
struct PixabayHit {
    id: u64,
    #[serde(default)]
    duration: f64,
    videos: PixabayRenditions,
}

#[derive(Debug, Deserialize)]
struct PixabayRenditions {
    large: Option<PixabayFile>,
    medium: Option<PixabayFile>,
    small: Option<PixabayFile>,
    tiny: Option<PixabayFile>,
}

#[derive(Debug, Deserialize)]
struct PixabayFile {
    #[serde(default)]
    url: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

pub fn parse_search(body: &str) -> Result<Vec<FootageCandidate>, serde_json::Error> {
    let parsed: SearchResponse = serde_json::from_str(body)?;
    Ok(parsed
        .hits
        .into_iter()
        .map(|hit| {
            let v = hit.videos;
            FootageCandidate {
                id: hit.id.to_string(),
                duration: hit.duration,
                // Pixabay lists renditions largest first; empty urls mean "not available".
                files: [v.large, v.medium, v.small, v.tiny]
                    .into_iter()
                    .flatten()
                    .filter(|f| !f.url.is_empty())
                    .map(|f| VideoFile {
                        width: f.width,
                        height: f.height,
                        url: f.url,
                    })
                    .collect(),
            }
        })
        .collect())
}

/// Secondary stock source, used for whatever the primary could not cover.
pub struct PixabaySource {
    client: Client,
    api_key: String,
}

impl PixabaySource {
    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl FootageSource for PixabaySource {
    fn name(&self) -> &str {
        NAME
    }

    async fn search(&self, keyword: &str, per_page: usize) -> Result<Vec<FootageCandidate>, ProviderError> {
        // The API rejects per_page outside 3..=200.
        let per_page = per_page.clamp(3, 200).to_string();
        let response = self
            .client
            .get(SEARCH_URL)
            .timeout(Duration::from_secs(30))
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", keyword),
                ("per_page", per_page.as_str()),
                ("safesearch", "true"),
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
