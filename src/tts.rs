use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use hound::WavReader;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{error, info};

use crate::config::VoiceEngine;
use crate::media::ffprobe_duration;

/// The narration track. Its duration is what the video is cut to.
#[derive(Debug, Clone, PartialEq)]
pub struct Voiceover {
    pub path: PathBuf,
    pub duration: f64,
}

#[async_trait]
pub trait VoiceSynthesizer: Send + Sync {
    fn name(&self) -> &str;

    /// Narrate `text` into a single file inside `dest_dir`.
    async fn synthesize(&self, text: &str, dest_dir: &Path) -> anyhow::Result<Voiceover>;
}

pub fn synthesizer(engine: VoiceEngine, voice: &str) -> Box<dyn VoiceSynthesizer> {
    match engine {
        VoiceEngine::Edge => Box::new(EdgeTtsSynthesizer::new(voice)),
        VoiceEngine::Piper => Box::new(PiperSynthesizer::new(voice)),
    }
}

pub fn wav_duration_seconds(path: &Path) -> anyhow::Result<f64> {
    let reader = WavReader::open(path).with_context(|| format!("reading WAV header of {}", path.display()))?;
    let spec = reader.spec();
    let samples = reader.len();
    let frames = samples as f64 / spec.channels as f64;
    let duration = frames / spec.sample_rate as f64;
    Ok(duration)
}

fn checked(path: PathBuf, duration: f64) -> anyhow::Result<Voiceover> {
    if !duration.is_finite() || duration <= 0.0 {
        anyhow::bail!("voiceover {} has no audible duration ({})", path.display(), duration);
    }
    Ok(Voiceover { path, duration })
}

/// Local Piper model reading the script from stdin.
pub struct PiperSynthesizer {
    model: String,
}

impl PiperSynthesizer {
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into() }
    }
}

#[async_trait]
impl VoiceSynthesizer for PiperSynthesizer {
    fn name(&self) -> &str {
        "piper"
    }

    async fn synthesize(&self, text: &str, dest_dir: &Path) -> anyhow::Result<Voiceover> {
        let out_path = dest_dir.join("voiceover.wav");
        info!("Calling Piper TTS for output file {}", out_path.display());

        let mut child = Command::new("piper")
            .arg("--model")
            .arg(&self.model)
            .arg("--output_file")
            .arg(&out_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn piper process")?;

        {
            let mut stdin = child.stdin.take().context("failed to open piper stdin")?;
            stdin.write_all(text.as_bytes()).await?;
        }

        let status = child.wait().await?;
        if !status.success() {
            error!("Piper TTS command failed for {}", out_path.display());
            anyhow::bail!("piper returned {}", status);
        }

        let duration = wav_duration_seconds(&out_path)?;
        info!("Piper voiceover generated: {:.2} seconds", duration);
        checked(out_path, duration)
    }
}

/// Microsoft Edge neural voices through the `edge-tts` CLI.
pub struct EdgeTtsSynthesizer {
    voice: String,
}

impl EdgeTtsSynthesizer {
    pub fn new(voice: impl Into<String>) -> Self {
        Self { voice: voice.into() }
    }
}

#[async_trait]
impl VoiceSynthesizer for EdgeTtsSynthesizer {
    fn name(&self) -> &str {
        "edge-tts"
    }

    async fn synthesize(&self, text: &str, dest_dir: &Path) -> anyhow::Result<Voiceover> {
        let out_path = dest_dir.join("voiceover.mp3");
        let script = tempfile::Builder::new()
            .prefix("narration")
            .suffix(".txt")
            .tempfile()
            .context("creating narration text file")?;
        tokio::fs::write(script.path(), text).await?;

        info!("Calling edge-tts with voice {} for {}", self.voice, out_path.display());
        let output = Command::new("edge-tts")
            .arg("--voice")
            .arg(&self.voice)
            .arg("--file")
            .arg(script.path())
            .arg("--write-media")
            .arg(&out_path)
            .stdin(Stdio::null())
            .output()
            .await
            .context("failed to spawn edge-tts")?;
        if !output.status.success() {
            error!("edge-tts failed for {}", out_path.display());
            anyhow::bail!(
                "edge-tts returned {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let duration = ffprobe_duration(&out_path).await?;
        info!("Edge voiceover generated: {:.2} seconds", duration);
        checked(out_path, duration)
    }
}
