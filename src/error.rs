use std::path::PathBuf;
use thiserror::Error;

/// Run-ending failures. Anything that can degrade is handled before it
/// reaches this type.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid run input: {reason}")]
    InvalidInput { reason: String },

    #[error("Script generation failed: every text provider was exhausted ({tried} tried)")]
    ScriptGenerationFailed { tried: usize },

    #[error("Voice synthesis failed: {reason}")]
    VoiceSynthesisFailed { reason: String },

    #[error("No usable footage: none of {attempted} clips could be loaded")]
    NoUsableFootage { attempted: usize },

    #[error("Render failed for {output}: {reason}")]
    RenderFailed { output: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failure of a single provider or footage source call. These never end a
/// run on their own; callers turn them into "yielded nothing".
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider}: not reachable")]
    Unavailable { provider: String },

    #[error("{provider}: HTTP {status}")]
    Status { provider: String, status: u16 },

    #[error("{provider}: request failed: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider}: empty reply")]
    EmptyReply { provider: String },

    #[error("{provider}: unexpected reply shape: {detail}")]
    MalformedReply { provider: String, detail: String },
}

impl ProviderError {
    pub fn transport(provider: &str, source: reqwest::Error) -> Self {
        ProviderError::Transport {
            provider: provider.to_string(),
            source,
        }
    }
}
