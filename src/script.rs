use std::sync::LazyLock;

use regex::Regex;
use tracing::{error, info};

use crate::error::{PipelineError, Result};
use crate::fallback::FallbackChain;

/// Average narration pace used to size the script.
pub const WORDS_PER_MINUTE: f64 = 150.0;

static SECTION_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[A-Za-z0-9 #:_\-]{1,40}\]").unwrap());
static HEADING_HASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]*").unwrap());
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*{1,3}").unwrap());
static STAGE_DIRECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\([^)\n]*\)[ \t]*$").unwrap());
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*(\n[ \t]*)+").unwrap());

pub fn target_word_count(length_minutes: f64) -> u32 {
    (length_minutes * WORDS_PER_MINUTE).round() as u32
}

fn section_count(length_minutes: f64) -> u32 {
    (length_minutes.round() as u32).clamp(3, 6)
}

pub fn build_prompt(topic: &str, length_minutes: f64) -> String {
    let words = target_word_count(length_minutes);
    let sections = section_count(length_minutes);
    format!(
        r#"Write a YouTube video script about: {topic}

Requirements:
- Approximately {words} words ({length_minutes} minutes when spoken)
- Start with an attention-grabbing hook (first 30 seconds)
- Include {sections} main sections with clear transitions
- End with a strong call to action (subscribe, like, comment)
- Conversational, engaging tone
- No stage directions or narrator notes - just the spoken words

Write the complete script now:"#
    )
}

/// Strip section labels and markdown so only spoken words reach the voice.
pub fn narration_text(script: &str) -> String {
    let text = SECTION_LABEL.replace_all(script, "");
    let text = STAGE_DIRECTION.replace_all(&text, "");
    let text = HEADING_HASHES.replace_all(&text, "");
    let text = EMPHASIS.replace_all(&text, "");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}

pub struct ScriptGenerator<'a> {
    chain: &'a FallbackChain,
}

impl<'a> ScriptGenerator<'a> {
    pub fn new(chain: &'a FallbackChain) -> Self {
        Self { chain }
    }

    pub async fn generate(&self, topic: &str, length_minutes: f64) -> Result<String> {
        if topic.trim().is_empty() {
            return Err(PipelineError::InvalidInput {
                reason: "topic must not be empty".into(),
            });
        }
        if !(length_minutes > 0.0) {
            return Err(PipelineError::InvalidInput {
                reason: format!("length must be positive, got {}", length_minutes),
            });
        }

        info!(
            "Generating script for '{}' (~{} words)",
            topic,
            target_word_count(length_minutes)
        );
        let prompt = build_prompt(topic, length_minutes);
        // Tokens run ahead of words; leave headroom so the script is not cut off.
        let max_tokens = (target_word_count(length_minutes) * 2).max(1024);

        match self.chain.generate(&prompt, max_tokens).await {
            Ok(reply) => {
                info!("Script generated by {} ({} chars)", reply.provider, reply.text.len());
                Ok(reply.text)
            }
            Err(e) => {
                error!("Could not generate script: {}", e);
                Err(PipelineError::ScriptGenerationFailed {
                    tried: e.failures.len(),
                })
            }
        }
    }
}
