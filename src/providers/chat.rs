use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::TextProvider;
use crate::config::ProviderKind;
use crate::error::ProviderError;

/// Any provider speaking the OpenAI chat-completions dialect
/// (Groq, Gemini's compatibility endpoint, OpenAI itself).
pub struct ChatCompletionsProvider {
    client: Client,
    kind: ProviderKind,
    api_key: String,
}

impl ChatCompletionsProvider {
    pub fn new(client: Client, kind: ProviderKind, api_key: String) -> Self {
        Self {
            client,
            kind,
            api_key,
        }
    }
}

#[async_trait]
impl TextProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        self.kind.name()
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        let endpoint = self.kind.endpoint();
        let name = self.kind.name();

        let response = self
            .client
            .post(endpoint.api_url)
            .timeout(Duration::from_secs(180))
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": endpoint.model,
                "messages": [
                    { "role": "user", "content": prompt },
                ],
                "max_tokens": max_tokens,
                "temperature": 0.7,
            }))
            .send()
            .await
            .map_err(|e| ProviderError::transport(name, e))?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                provider: name.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ProviderError::transport(name, e))?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::MalformedReply {
                provider: name.to_string(),
                detail: format!("no choices[0].message.content in {}", body),
            })
    }
}
