use tracing::{info, warn};

use crate::fallback::FallbackChain;
use crate::segments::{ExtractionError, SCRIPT_PREFIX_CHARS, truncate_chars};
use crate::structured::first_json_array;

const MAX_KEY_POINTS: usize = 6;

pub fn build_prompt(script: &str) -> String {
    format!(
        r#"Pick 4-6 short key points from this video script to show as on-screen text.
Each key point must be at most 8 words and read well on its own.

Return ONLY a JSON array of strings, for example: ["First point", "Second point"]

SCRIPT:
{}"#,
        truncate_chars(script, SCRIPT_PREFIX_CHARS)
    )
}

pub fn parse_key_points(reply: &str) -> Option<Vec<String>> {
    let points: Vec<String> = first_json_array::<String>(reply)?
        .into_iter()
        .map(|p| p.trim().trim_matches('"').to_string())
        .filter(|p| !p.is_empty())
        .take(MAX_KEY_POINTS)
        .collect();
    (!points.is_empty()).then_some(points)
}

/// Phrases for timed on-screen overlays. Callers render without overlays
/// when this fails.
pub struct KeyPointExtractor<'a> {
    chain: &'a FallbackChain,
}

impl<'a> KeyPointExtractor<'a> {
    pub fn new(chain: &'a FallbackChain) -> Self {
        Self { chain }
    }

    pub async fn extract(&self, script: &str) -> Result<Vec<String>, ExtractionError> {
        let reply = self.chain.generate(&build_prompt(script), 512).await?;
        match parse_key_points(&reply.text) {
            Some(points) => {
                info!("Extracted {} key points for overlays", points.len());
                Ok(points)
            }
            None => {
                warn!("Key point reply from {} was not a JSON list of strings", reply.provider);
                Err(ExtractionError::NoStructure {
                    provider: reply.provider,
                })
            }
        }
    }
}
