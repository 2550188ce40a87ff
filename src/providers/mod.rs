//! Text-generation providers and the factory that turns configuration into
//! an ordered provider list.

mod chat;
mod ollama;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{Credentials, ProviderKind};
use crate::error::ProviderError;

pub use chat::ChatCompletionsProvider;
pub use ollama::OllamaProvider;

#[async_trait]
pub trait TextProvider: Send + Sync {
    fn name(&self) -> &str;

    /// One prompt in, one reply out. No retries here.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError>;
}

/// Build providers in `order`, leaving out hosted ones with no API key.
pub fn text_providers(order: &[ProviderKind], credentials: &Credentials) -> Vec<Box<dyn TextProvider>> {
    let client = reqwest::Client::new();
    let mut providers: Vec<Box<dyn TextProvider>> = Vec::new();
    for kind in order {
        match kind {
            ProviderKind::Ollama => {
                let base_url = credentials
                    .ollama_url
                    .clone()
                    .unwrap_or_else(|| kind.endpoint().api_url.to_string());
                providers.push(Box::new(OllamaProvider::new(
                    client.clone(),
                    base_url,
                    kind.endpoint().model,
                )));
            }
            hosted => match credentials.api_key(*hosted) {
                Some(key) => providers.push(Box::new(ChatCompletionsProvider::new(
                    client.clone(),
                    *hosted,
                    key.to_string(),
                ))),
                None => debug!(
                    "Skipping {}: {} not set",
                    hosted.name(),
                    hosted.endpoint().env_var
                ),
            },
        }
    }
    providers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosted_providers_without_keys_are_left_out() {
        let credentials = Credentials {
            gemini_api_key: Some("g-key".into()),
            ..Credentials::default()
        };
        let providers = text_providers(&ProviderKind::AUTO_ORDER, &credentials);
        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Ollama", "Gemini"]);
    }
}
