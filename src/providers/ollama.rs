use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::TextProvider;
use crate::error::ProviderError;

const NAME: &str = "Ollama";

/// Local model served by `ollama serve`.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(client: Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    async fn is_running(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl TextProvider for OllamaProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        if !self.is_running().await {
            return Err(ProviderError::Unavailable {
                provider: NAME.to_string(),
            });
        }
        debug!("Ollama request with model {}", self.model);

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(Duration::from_secs(300))
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
                "options": { "num_predict": max_tokens },
            }))
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
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ProviderError::transport(NAME, e))?;

        body["response"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::MalformedReply {
                provider: NAME.to_string(),
                detail: "missing 'response' field".to_string(),
            })
    }
}
