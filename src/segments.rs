use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::fallback::{ChainExhausted, FallbackChain};
use crate::structured::first_json_array;

/// Only the opening of the script is sent; later segments still only need
/// topical keywords.
pub const SCRIPT_PREFIX_CHARS: usize = 3000;
const MAX_SEGMENTS: usize = 7;
const MAX_KEYWORDS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub ordinal: usize,
    pub summary: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    #[serde(default, alias = "description", alias = "title")]
    summary: String,
    #[serde(default, alias = "search_terms")]
    keywords: Vec<String>,
}

/// Soft failures of model-driven extraction; callers degrade on these.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error(transparent)]
    Providers(#[from] ChainExhausted),

    #[error("reply from {provider} held no usable JSON list")]
    NoStructure { provider: String },
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn build_prompt(script: &str) -> String {
    format!(
        r#"Split the following video script into 5-7 segments in narrative order.
For each segment give a one-sentence summary and 2-3 short visual search keywords
for stock footage (concrete, filmable things, 1-3 words each).

Return ONLY a JSON array in this exact shape:
[{{"summary": "What this part is about", "keywords": ["keyword one", "keyword two"]}}]

SCRIPT:
{}"#,
        truncate_chars(script, SCRIPT_PREFIX_CHARS)
    )
}

fn normalize(raw: Vec<RawSegment>) -> Vec<Segment> {
    raw.into_iter()
        .filter_map(|seg| {
            let keywords: Vec<String> = seg
                .keywords
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .take(MAX_KEYWORDS)
                .collect();
            (!keywords.is_empty()).then(|| (seg.summary.trim().to_string(), keywords))
        })
        .take(MAX_SEGMENTS)
        .enumerate()
        .map(|(i, (summary, keywords))| Segment {
            ordinal: i + 1,
            summary,
            keywords,
        })
        .collect()
}

pub fn parse_segments(reply: &str) -> Option<Vec<Segment>> {
    let segments = normalize(first_json_array::<RawSegment>(reply)?);
    (!segments.is_empty()).then_some(segments)
}

pub struct SegmentExtractor<'a> {
    chain: &'a FallbackChain,
}

impl<'a> SegmentExtractor<'a> {
    pub fn new(chain: &'a FallbackChain) -> Self {
        Self { chain }
    }

    pub async fn extract(&self, script: &str) -> Result<Vec<Segment>, ExtractionError> {
        let reply = self.chain.generate(&build_prompt(script), 1024).await?;
        match parse_segments(&reply.text) {
            Some(segments) => {
                info!("Extracted {} footage segments", segments.len());
                for seg in &segments {
                    info!("  segment {}: {:?}", seg.ordinal, seg.keywords);
                }
                Ok(segments)
            }
            None => {
                warn!("Segment reply from {} was not a usable JSON list", reply.provider);
                Err(ExtractionError::NoStructure {
                    provider: reply.provider,
                })
            }
        }
    }
}
