pub mod assembler;
pub mod config;
pub mod error;
pub mod fallback;
pub mod footage;
pub mod keypoints;
pub mod media;
pub mod metadata;
pub mod pipeline;
pub mod providers;
pub mod publish;
pub mod schedule;
pub mod script;
pub mod segments;
pub mod structured;
pub mod thumbnail;
pub mod timeline;
pub mod trends;
pub mod tts;

pub use config::{RunConfig, Settings};
pub use error::{PipelineError, ProviderError, Result};
pub use pipeline::{Components, Pipeline, RunReport};
