//! ffmpeg / ffprobe plumbing.
//!
//! Argument and filter-graph construction is pure so it can be tested
//! without the binaries installed; `FfmpegBackend` only spawns processes.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::RenderSettings;
use crate::footage::download::partial_path;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// One cut of a clip on the output track, in track order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInput {
    pub path: PathBuf,
    pub duration: f64,
}

/// A text file drawn over the track between `start` and `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    pub text_file: PathBuf,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone)]
pub struct RenderJob {
    pub inputs: Vec<RenderInput>,
    pub audio: PathBuf,
    pub overlays: Vec<OverlayLayer>,
    pub duration: f64,
    pub output: PathBuf,
    pub settings: RenderSettings,
}

/// Centred caption burnt into a still image.
#[derive(Debug, Clone)]
pub struct Caption<'a> {
    pub text_file: &'a Path,
    pub font_size: u32,
    pub font_file: Option<&'a Path>,
}

#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn probe_duration(&self, path: &Path) -> anyhow::Result<f64>;

    async fn placeholder_clip(
        &self,
        color: (u8, u8, u8),
        seconds: f64,
        settings: &RenderSettings,
        dest: &Path,
    ) -> anyhow::Result<()>;

    async fn render(&self, job: &RenderJob) -> anyhow::Result<()>;

    async fn caption_image(&self, image: &Path, caption: &Caption<'_>, output: &Path) -> anyhow::Result<()>;
}

/// Quote a value for use inside a filter graph option.
pub fn escape_filter_value(value: &str) -> String {
    format!("'{}'", value.replace('\\', "/").replace('\'', "'\\''"))
}

fn seconds(value: f64) -> String {
    format!("{:.3}", value)
}

fn drawtext(settings: &RenderSettings, overlay: &OverlayLayer) -> String {
    let mut filter = format!("drawtext=textfile={}", escape_filter_value(&overlay.text_file.to_string_lossy()));
    if let Some(font) = &settings.font_file {
        filter.push_str(&format!(":fontfile={}", escape_filter_value(&font.to_string_lossy())));
    }
    filter.push_str(&format!(
        ":fontsize={}:fontcolor=white:borderw=4:bordercolor=black:line_spacing=12\
         :x=(w-text_w)/2:y=h*0.75-text_h/2:enable='between(t,{},{})'",
        settings.overlay_font_size,
        seconds(overlay.start),
        seconds(overlay.end)
    ));
    filter
}

/// Normalise every input to the output frame, concatenate, then layer text.
pub fn filter_graph(job: &RenderJob) -> String {
    let s = &job.settings;
    let mut graph = String::new();
    for i in 0..job.inputs.len() {
        graph.push_str(&format!(
            "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},format={pix}[v{i}];",
            i = i,
            w = s.width,
            h = s.height,
            fps = s.fps,
            pix = s.pixel_format
        ));
    }
    for i in 0..job.inputs.len() {
        graph.push_str(&format!("[v{}]", i));
    }
    graph.push_str(&format!("concat=n={}:v=1:a=0[base];", job.inputs.len()));

    if job.overlays.is_empty() {
        graph.push_str("[base]null[vout]");
    } else {
        let layers: Vec<String> = job.overlays.iter().map(|o| drawtext(s, o)).collect();
        graph.push_str(&format!("[base]{}[vout]", layers.join(",")));
    }
    graph
}

/// Full ffmpeg argument list; the output is always written as mp4 so it can
/// carry a temporary name.
pub fn render_args(job: &RenderJob) -> Vec<String> {
    let s = &job.settings;
    let mut args: Vec<String> = vec!["-y".into(), "-hide_banner".into(), "-loglevel".into(), "error".into()];
    for input in &job.inputs {
        args.extend([
            "-t".into(),
            seconds(input.duration),
            "-i".into(),
            input.path.to_string_lossy().into_owned(),
        ]);
    }
    args.extend(["-i".into(), job.audio.to_string_lossy().into_owned()]);
    args.extend([
        "-filter_complex".into(),
        filter_graph(job),
        "-map".into(),
        "[vout]".into(),
        "-map".into(),
        format!("{}:a:0", job.inputs.len()),
        "-c:v".into(),
        s.video_codec.clone(),
        "-c:a".into(),
        s.audio_codec.clone(),
        "-pix_fmt".into(),
        s.pixel_format.clone(),
        "-r".into(),
        s.fps.to_string(),
        "-t".into(),
        seconds(job.duration),
        "-movflags".into(),
        "+faststart".into(),
        "-f".into(),
        "mp4".into(),
        job.output.to_string_lossy().into_owned(),
    ]);
    args
}

pub fn placeholder_args(color: (u8, u8, u8), seconds_long: f64, settings: &RenderSettings, dest: &Path) -> Vec<String> {
    let (r, g, b) = color;
    vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "lavfi".into(),
        "-i".into(),
        format!(
            "color=c=0x{:02X}{:02X}{:02X}:s={}x{}:r={}:d={}",
            r,
            g,
            b,
            settings.width,
            settings.height,
            settings.fps,
            seconds(seconds_long)
        ),
        "-c:v".into(),
        settings.video_codec.clone(),
        "-pix_fmt".into(),
        settings.pixel_format.clone(),
        "-f".into(),
        "mp4".into(),
        dest.to_string_lossy().into_owned(),
    ]
}

pub fn caption_args(image: &Path, caption: &Caption<'_>, output: &Path) -> Vec<String> {
    let mut filter = format!("drawtext=textfile={}", escape_filter_value(&caption.text_file.to_string_lossy()));
    if let Some(font) = caption.font_file {
        filter.push_str(&format!(":fontfile={}", escape_filter_value(&font.to_string_lossy())));
    }
    filter.push_str(&format!(
        ":fontsize={}:fontcolor=white:shadowcolor=black:shadowx=3:shadowy=3\
         :line_spacing=10:x=(w-text_w)/2:y=(h-text_h)/2",
        caption.font_size
    ));
    vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        image.to_string_lossy().into_owned(),
        "-vf".into(),
        filter,
        "-frames:v".into(),
        "1".into(),
        output.to_string_lossy().into_owned(),
    ]
}

async fn run_ffmpeg(args: &[String]) -> anyhow::Result<()> {
    debug!("ffmpeg {}", args.join(" "));
    let output = Command::new("ffmpeg")
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .context("failed to spawn ffmpeg")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("ffmpeg exited with {}: {}", output.status, stderr.trim());
    }
    Ok(())
}

/// Container duration in seconds as reported by ffprobe.
pub async fn ffprobe_duration(path: &Path) -> anyhow::Result<f64> {
    let probe = Command::new("ffprobe")
        .args(["-v", "error", "-show_entries", "format=duration", "-of", "default=noprint_wrappers=1:nokey=1"])
        .arg(path)
        .stdin(Stdio::null())
        .output();
    let output = tokio::time::timeout(PROBE_TIMEOUT, probe)
        .await
        .with_context(|| format!("ffprobe timed out on {}", path.display()))?
        .context("failed to spawn ffprobe")?;
    if !output.status.success() {
        anyhow::bail!(
            "ffprobe failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let duration: f64 = text
        .trim()
        .parse()
        .with_context(|| format!("unparseable duration '{}' for {}", text.trim(), path.display()))?;
    Ok(duration)
}

/// Shells out to the ffmpeg tools on PATH.
#[derive(Debug, Default, Clone)]
pub struct FfmpegBackend;

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn probe_duration(&self, path: &Path) -> anyhow::Result<f64> {
        ffprobe_duration(path).await
    }

    async fn placeholder_clip(
        &self,
        color: (u8, u8, u8),
        seconds_long: f64,
        settings: &RenderSettings,
        dest: &Path,
    ) -> anyhow::Result<()> {
        let partial = partial_path(dest);
        if let Err(e) = run_ffmpeg(&placeholder_args(color, seconds_long, settings, &partial)).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
        tokio::fs::rename(&partial, dest).await?;
        info!("Placeholder clip written to {}", dest.display());
        Ok(())
    }

    async fn render(&self, job: &RenderJob) -> anyhow::Result<()> {
        info!(
            "Rendering {} cuts with {} overlays to {}",
            job.inputs.len(),
            job.overlays.len(),
            job.output.display()
        );
        run_ffmpeg(&render_args(job)).await
    }

    async fn caption_image(&self, image: &Path, caption: &Caption<'_>, output: &Path) -> anyhow::Result<()> {
        run_ffmpeg(&caption_args(image, caption, output)).await
    }
}
