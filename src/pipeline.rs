//! Stage sequencing for one run.
//!
//! Script, voiceover and assembly end the run when they fail. Everything
//! else degrades: the stage is recorded in `RunReport::degraded` and the run
//! carries on.

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::assembler::TimelineAssembler;
use crate::config::{RunConfig, RunLayout, Settings};
use crate::error::{PipelineError, Result};
use crate::fallback::FallbackChain;
use crate::footage::{FootageAcquirer, FootageSource, footage_sources, topic_keywords};
use crate::keypoints::KeyPointExtractor;
use crate::media::{FfmpegBackend, MediaBackend};
use crate::metadata::VideoMetadata;
use crate::providers::{TextProvider, text_providers};
use crate::publish::{Publisher, YouTubePublisher};
use crate::script::{ScriptGenerator, narration_text};
use crate::segments::SegmentExtractor;
use crate::thumbnail::ThumbnailComposer;
use crate::tts::{VoiceSynthesizer, Voiceover, synthesizer};

/// The external collaborators of a run.
pub struct Components {
    pub text_providers: Vec<Box<dyn TextProvider>>,
    pub voice: Box<dyn VoiceSynthesizer>,
    pub footage_sources: Vec<Box<dyn FootageSource>>,
    pub media: Box<dyn MediaBackend>,
    pub publisher: Option<Box<dyn Publisher>>,
}

impl Components {
    /// Real providers, CLI tools and HTTP clients configured from `settings`.
    pub fn from_config(config: &RunConfig, settings: &Settings) -> Self {
        let publisher: Option<Box<dyn Publisher>> = settings.credentials.youtube_access_token.as_ref().map(|token| {
            Box::new(YouTubePublisher::new(
                reqwest::Client::new(),
                token.clone(),
                settings.youtube_privacy.clone(),
                settings.youtube_category.clone(),
            )) as Box<dyn Publisher>
        });
        Self {
            text_providers: text_providers(&config.ai_provider.resolve(), &settings.credentials),
            voice: synthesizer(config.voice_engine, config.voice()),
            footage_sources: footage_sources(&settings.credentials),
            media: Box::new(FfmpegBackend),
            publisher,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub root: PathBuf,
    pub script: PathBuf,
    pub voiceover: Voiceover,
    pub video: PathBuf,
    pub thumbnail: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
    pub published_url: Option<String>,
    /// Stages that were skipped or fell back, with the reason.
    pub degraded: Vec<String>,
}

pub struct Pipeline {
    config: RunConfig,
    settings: Settings,
    chain: FallbackChain,
    voice: Box<dyn VoiceSynthesizer>,
    footage_sources: Vec<Box<dyn FootageSource>>,
    media: Box<dyn MediaBackend>,
    publisher: Option<Box<dyn Publisher>>,
}

impl Pipeline {
    pub fn new(config: RunConfig, settings: Settings) -> Self {
        let components = Components::from_config(&config, &settings);
        Self::with_components(config, settings, components)
    }

    pub fn with_components(config: RunConfig, settings: Settings, components: Components) -> Self {
        Self {
            config,
            settings,
            chain: FallbackChain::new(components.text_providers),
            voice: components.voice,
            footage_sources: components.footage_sources,
            media: components.media,
            publisher: components.publisher,
        }
    }

    pub async fn run(&self) -> Result<RunReport> {
        let topic = self.config.topic.trim();
        let layout = RunLayout::new(&self.settings.projects_root, self.config.output_directory_name.as_deref());
        layout.create().await?;
        info!("Starting run for '{}' in {}", topic, layout.root.display());
        let mut degraded: Vec<String> = Vec::new();

        info!("Step 1/7: generating script");
        let script = ScriptGenerator::new(&self.chain)
            .generate(topic, self.config.length_minutes)
            .await?;
        let script_path = layout.script_path();
        tokio::fs::write(&script_path, &script).await?;
        info!("Script saved to {}", script_path.display());

        info!("Step 2/7: synthesizing voiceover with {}", self.voice.name());
        let narration = narration_text(&script);
        if narration.is_empty() {
            return Err(PipelineError::VoiceSynthesisFailed {
                reason: "script has no narratable text".into(),
            });
        }
        let voiceover = self
            .voice
            .synthesize(&narration, &layout.voiceovers)
            .await
            .map_err(|e| {
                error!("Voiceover failed: {:#}", e);
                PipelineError::VoiceSynthesisFailed {
                    reason: format!("{:#}", e),
                }
            })?;
        info!("Voiceover is {:.2} seconds", voiceover.duration);

        info!("Step 3/7: acquiring footage");
        let acquirer = FootageAcquirer::new(
            &self.footage_sources,
            self.media.as_ref(),
            &self.settings.footage,
            &self.settings.render,
            &layout.footage,
        );
        let override_keywords = self.config.footage_keywords.as_ref().filter(|k| !k.is_empty());
        let footage = match override_keywords {
            Some(keywords) => {
                info!("Using {} footage keywords from configuration", keywords.len());
                acquirer.acquire_flat(keywords).await
            }
            None => match SegmentExtractor::new(&self.chain).extract(&script).await {
                Ok(segments) => acquirer.acquire_segments(&segments).await,
                Err(e) => {
                    warn!("Segment extraction failed ({}); falling back to topic keywords", e);
                    degraded.push(format!("segment extraction: {}", e));
                    acquirer.acquire_flat(&topic_keywords(topic)).await
                }
            },
        };
        if footage.placeholder {
            degraded.push("footage: no stock clips found, placeholder clips used".into());
        }

        info!("Step 4/7: extracting key points");
        let key_points = match KeyPointExtractor::new(&self.chain).extract(&script).await {
            Ok(points) => points,
            Err(e) => {
                warn!("Key point extraction failed ({}); rendering without overlays", e);
                degraded.push(format!("key points: {}", e));
                Vec::new()
            }
        };

        info!("Step 5/7: assembling video");
        let clips: Vec<_> = footage.clips().cloned().collect();
        let video = TimelineAssembler::new(self.media.as_ref(), &self.settings.render)
            .assemble(&voiceover, &clips, &key_points, &layout.final_video_path())
            .await?;
        if !key_points.is_empty() && !video.overlays_rendered {
            degraded.push("overlays: render failed with overlays, produced without".into());
        }

        info!("Step 6/7: creating thumbnail and metadata");
        let thumbnail = match ThumbnailComposer::new(
            self.media.as_ref(),
            &self.settings.thumbnail_scheme,
            self.settings.render.font_file.as_deref(),
        )
        .compose(topic, &layout.thumbnail_path())
        .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Thumbnail failed: {:#}", e);
                degraded.push(format!("thumbnail: {:#}", e));
                None
            }
        };

        let metadata = VideoMetadata::compose(topic);
        let metadata_path = match metadata.write_json(&layout.metadata_path()).await {
            Ok(()) => Some(layout.metadata_path()),
            Err(e) => {
                warn!("Metadata failed: {:#}", e);
                degraded.push(format!("metadata: {:#}", e));
                None
            }
        };

        let mut published_url = None;
        if self.config.upload {
            info!("Step 7/7: publishing");
            let outcome = match &self.publisher {
                Some(publisher) => publisher
                    .publish(&video.path, thumbnail.as_deref(), &metadata)
                    .await
                    .map_err(|e| format!("{} upload failed: {:#}", publisher.name(), e)),
                None => Err("no publisher configured (YOUTUBE_ACCESS_TOKEN not set)".to_string()),
            };
            match outcome {
                Ok(url) => published_url = Some(url),
                Err(reason) => {
                    warn!("{}; saving metadata for manual upload", reason);
                    degraded.push(format!("upload: {}", reason));
                    let sheet = layout.metadata.join("upload_metadata.txt");
                    if let Err(e) = metadata
                        .write_manual_upload(&sheet, &video.path, thumbnail.as_deref())
                        .await
                    {
                        warn!("Could not save upload metadata: {:#}", e);
                    }
                }
            }
        } else {
            info!("Step 7/7: upload not requested, skipping");
        }

        info!("Run complete: {}", video.path.display());
        Ok(RunReport {
            root: layout.root,
            script: script_path,
            voiceover,
            video: video.path,
            thumbnail,
            metadata: metadata_path,
            published_url,
            degraded,
        })
    }
}
