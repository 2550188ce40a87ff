use thiserror::Error;
use tracing::{info, warn};

use crate::error::ProviderError;
use crate::providers::TextProvider;

#[derive(Error, Debug)]
#[error("all {} text providers failed", .failures.len())]
pub struct ChainExhausted {
    pub failures: Vec<(String, ProviderError)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainReply {
    pub provider: String,
    pub text: String,
}

/// Providers tried strictly in order; later ones are fallbacks, never races.
pub struct FallbackChain {
    providers: Vec<Box<dyn TextProvider>>,
}

impl FallbackChain {
    pub fn new(providers: Vec<Box<dyn TextProvider>>) -> Self {
        Self { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<ChainReply, ChainExhausted> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            info!("Trying text provider {}", provider.name());
            let outcome = match provider.generate(prompt, max_tokens).await {
                Ok(text) if text.trim().is_empty() => Err(ProviderError::EmptyReply {
                    provider: provider.name().to_string(),
                }),
                other => other,
            };

            match outcome {
                Ok(text) => {
                    info!(
                        "Text provider {} succeeded ({} chars)",
                        provider.name(),
                        text.len()
                    );
                    return Ok(ChainReply {
                        provider: provider.name().to_string(),
                        text,
                    });
                }
                Err(e) => {
                    warn!("Text provider {} failed: {}", provider.name(), e);
                    failures.push((provider.name().to_string(), e));
                }
            }
        }

        warn!("All {} text providers failed", failures.len());
        Err(ChainExhausted { failures })
    }
}
