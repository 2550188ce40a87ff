//! Turns narration plus footage into the final video.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{info, warn};

use crate::config::RenderSettings;
use crate::error::{PipelineError, Result};
use crate::footage::FootageClip;
use crate::media::{MediaBackend, OverlayLayer, RenderInput, RenderJob};
use crate::timeline::{Timeline, TimelineError, build_timeline};
use crate::tts::Voiceover;

/// Rough average glyph width relative to the font size.
const GLYPH_WIDTH_RATIO: f64 = 0.55;

#[derive(Debug, Clone)]
pub struct AssembledVideo {
    pub path: PathBuf,
    pub timeline: Timeline,
    pub overlays_rendered: bool,
}

/// Characters per overlay line that fit the configured pixel budget.
pub fn overlay_line_chars(settings: &RenderSettings) -> usize {
    let glyph = settings.overlay_font_size.max(1) as f64 * GLYPH_WIDTH_RATIO;
    ((settings.overlay_wrap_px as f64 / glyph).floor() as usize).max(8)
}

/// Greedy word wrap. A single word longer than `width` gets its own line.
pub fn wrap_text(s: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in s.split_whitespace() {
        if current.chars().count() + word.chars().count() + 1 > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// `final_video.mp4` renders into `final_video.partial.mp4` first.
pub fn partial_output(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    output.with_file_name(format!("{}.partial.mp4", stem))
}

pub struct TimelineAssembler<'a> {
    media: &'a dyn MediaBackend,
    settings: &'a RenderSettings,
}

impl<'a> TimelineAssembler<'a> {
    pub fn new(media: &'a dyn MediaBackend, settings: &'a RenderSettings) -> Self {
        Self { media, settings }
    }

    /// Probe every clip; ones that cannot be read are skipped.
    async fn load(&self, clips: &[FootageClip]) -> Vec<(PathBuf, f64)> {
        let mut loaded = Vec::new();
        for clip in clips {
            match self.media.probe_duration(&clip.path).await {
                Ok(duration) if duration > 0.0 => loaded.push((clip.path.clone(), duration)),
                Ok(duration) => warn!("Skipping {}: duration {}", clip.path.display(), duration),
                Err(e) => warn!("Skipping unreadable clip {}: {:#}", clip.path.display(), e),
            }
        }
        loaded
    }

    /// Write one text file per overlay. `None` means overlays are dropped.
    async fn prepare_overlays(&self, timeline: &Timeline) -> Option<(TempDir, Vec<OverlayLayer>)> {
        if timeline.overlays.is_empty() {
            return None;
        }
        let dir = match tempfile::Builder::new().prefix("overlays").tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Could not create overlay directory, rendering without overlays: {}", e);
                return None;
            }
        };

        let width = overlay_line_chars(self.settings);
        let mut layers = Vec::new();
        for (i, overlay) in timeline.overlays.iter().enumerate() {
            let text_file = dir.path().join(format!("overlay_{}.txt", i));
            let text = wrap_text(&overlay.text, width).join("\n");
            if let Err(e) = tokio::fs::write(&text_file, text).await {
                warn!("Could not write overlay text, rendering without overlays: {}", e);
                return None;
            }
            layers.push(OverlayLayer {
                text_file,
                start: overlay.start,
                end: overlay.end(),
            });
        }
        Some((dir, layers))
    }

    pub async fn assemble(
        &self,
        voiceover: &Voiceover,
        clips: &[FootageClip],
        key_points: &[String],
        output: &Path,
    ) -> Result<AssembledVideo> {
        let loaded = self.load(clips).await;
        if loaded.is_empty() {
            return Err(PipelineError::NoUsableFootage {
                attempted: clips.len(),
            });
        }
        info!("Loaded {}/{} clips", loaded.len(), clips.len());

        let durations: Vec<f64> = loaded.iter().map(|(_, d)| *d).collect();
        let timeline = build_timeline(voiceover.duration, &durations, key_points).map_err(|e| match e {
            TimelineError::NoFootage => PipelineError::NoUsableFootage {
                attempted: clips.len(),
            },
            TimelineError::InvalidDuration(d) => PipelineError::VoiceSynthesisFailed {
                reason: format!("narration duration {} is not usable", d),
            },
        })?;
        info!(
            "Timeline: {:.2}s narration, sequence looped {} time(s), {} cuts, {} overlays",
            timeline.duration,
            timeline.loops,
            timeline.entries.len(),
            timeline.overlays.len()
        );

        let overlays = self.prepare_overlays(&timeline).await;
        let partial = partial_output(output);
        let mut job = RenderJob {
            inputs: timeline
                .entries
                .iter()
                .map(|entry| RenderInput {
                    path: loaded[entry.clip].0.clone(),
                    duration: entry.duration(),
                })
                .collect(),
            audio: voiceover.path.clone(),
            overlays: overlays.as_ref().map(|(_, layers)| layers.clone()).unwrap_or_default(),
            duration: timeline.duration,
            output: partial.clone(),
            settings: self.settings.clone(),
        };

        let mut result = self.media.render(&job).await;
        if let Err(e) = &result {
            if !job.overlays.is_empty() {
                warn!("Render with overlays failed ({:#}); retrying without overlays", e);
                let _ = tokio::fs::remove_file(&partial).await;
                job.overlays.clear();
                result = self.media.render(&job).await;
            }
        }
        let overlays_rendered = !job.overlays.is_empty();
        drop(overlays);

        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(PipelineError::RenderFailed {
                output: output.to_path_buf(),
                reason: format!("{:#}", e),
            });
        }
        tokio::fs::rename(&partial, output).await?;
        info!("Final video written to {}", output.display());

        Ok(AssembledVideo {
            path: output.to_path_buf(),
            timeline,
            overlays_rendered,
        })
    }
}
