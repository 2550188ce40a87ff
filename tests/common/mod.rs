#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use faceless::config::{RenderSettings, RunConfig, Settings};
use faceless::error::ProviderError;
use faceless::footage::{FootageCandidate, FootageSource, VideoFile};
use faceless::media::{Caption, MediaBackend, RenderJob};
use faceless::metadata::VideoMetadata;
use faceless::pipeline::Components;
use faceless::providers::TextProvider;
use faceless::publish::Publisher;
use faceless::tts::{VoiceSynthesizer, Voiceover};

pub const SCRIPT: &str = "[HOOK]\nSharks are older than trees.\n\n## Part one\nThey have **no bones** at all.\n(pause)\nSubscribe for more!";
pub const SEGMENTS: &str = r#"Sure: [{"summary": "Ancient sharks", "keywords": ["shark", "ocean"]},
{"summary": "Cartilage", "keywords": ["skeleton"]}]"#;
pub const KEY_POINTS: &str = r#"["Sharks predate trees", "No bones at all"]"#;

/// Answers by recognising which stage built the prompt.
#[derive(Default)]
pub struct RoutedProvider {
    pub name: String,
    pub script: Option<String>,
    pub segments: Option<String>,
    pub key_points: Option<String>,
    pub calls: AtomicUsize,
    pub segment_calls: AtomicUsize,
}

impl RoutedProvider {
    pub fn healthy(name: &str) -> Self {
        Self {
            name: name.into(),
            script: Some(SCRIPT.into()),
            segments: Some(SEGMENTS.into()),
            key_points: Some(KEY_POINTS.into()),
            ..Default::default()
        }
    }

    pub fn down(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TextProvider for RoutedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = if prompt.starts_with("Split the following video script") {
            self.segment_calls.fetch_add(1, Ordering::SeqCst);
            &self.segments
        } else if prompt.starts_with("Pick 4-6 short key points") {
            &self.key_points
        } else {
            &self.script
        };
        reply.clone().ok_or_else(|| ProviderError::Unavailable {
            provider: self.name.clone(),
        })
    }
}

pub struct FakeVoice {
    pub duration: f64,
    pub fail: bool,
    pub narrated: Mutex<Vec<String>>,
}

impl FakeVoice {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            fail: false,
            narrated: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VoiceSynthesizer for FakeVoice {
    fn name(&self) -> &str {
        "fake-voice"
    }

    async fn synthesize(&self, text: &str, dest_dir: &Path) -> anyhow::Result<Voiceover> {
        self.narrated.lock().unwrap().push(text.to_string());
        if self.fail {
            anyhow::bail!("edge-tts: voice not found");
        }
        let path = dest_dir.join("voiceover.mp3");
        std::fs::write(&path, b"audio")?;
        Ok(Voiceover {
            path,
            duration: self.duration,
        })
    }
}

pub fn candidate(id: &str, duration: f64, heights: &[u32]) -> FootageCandidate {
    FootageCandidate {
        id: id.into(),
        duration,
        files: heights
            .iter()
            .map(|h| VideoFile {
                width: h * 16 / 9,
                height: *h,
                url: format!("https://cdn.test/{}/{}.mp4", id, h),
            })
            .collect(),
    }
}

/// Downloads write the candidate's duration as the file body so the fake
/// media backend can probe it back.
#[derive(Default)]
pub struct FakeSource {
    pub name: String,
    pub results: HashMap<String, Vec<FootageCandidate>>,
    pub fail_search: bool,
    pub searches: Mutex<Vec<String>>,
    pub downloads: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with(mut self, keyword: &str, candidates: Vec<FootageCandidate>) -> Self {
        self.results.insert(keyword.into(), candidates);
        self
    }

    pub fn searched(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl FootageSource for FakeSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, keyword: &str, _per_page: usize) -> Result<Vec<FootageCandidate>, ProviderError> {
        self.searches.lock().unwrap().push(keyword.to_string());
        if self.fail_search {
            return Err(ProviderError::Status {
                provider: self.name.clone(),
                status: 429,
            });
        }
        Ok(self.results.get(keyword).cloned().unwrap_or_default())
    }

    async fn download(&self, url: &str, dest: &Path) -> anyhow::Result<()> {
        self.downloads.lock().unwrap().push(url.to_string());
        let duration = self
            .results
            .values()
            .flatten()
            .find(|c| c.files.iter().any(|f| f.url == url))
            .map(|c| c.duration)
            .unwrap_or(10.0);
        std::fs::write(dest, duration.to_string())?;
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMedia {
    pub jobs: Mutex<Vec<RenderJob>>,
    pub placeholders: AtomicUsize,
}

#[async_trait]
impl MediaBackend for FakeMedia {
    async fn probe_duration(&self, path: &Path) -> anyhow::Result<f64> {
        Ok(std::fs::read_to_string(path)?.trim().parse()?)
    }

    async fn placeholder_clip(
        &self,
        _color: (u8, u8, u8),
        seconds: f64,
        _settings: &RenderSettings,
        dest: &Path,
    ) -> anyhow::Result<()> {
        self.placeholders.fetch_add(1, Ordering::SeqCst);
        std::fs::write(dest, seconds.to_string())?;
        Ok(())
    }

    async fn render(&self, job: &RenderJob) -> anyhow::Result<()> {
        self.jobs.lock().unwrap().push(job.clone());
        std::fs::write(&job.output, b"mp4")?;
        Ok(())
    }

    async fn caption_image(&self, image: &Path, _caption: &Caption<'_>, output: &Path) -> anyhow::Result<()> {
        std::fs::copy(image, output)?;
        Ok(())
    }
}

/// Shares the fake with the test after the pipeline takes ownership.
pub struct Shared<T>(pub std::sync::Arc<T>);

#[async_trait]
impl MediaBackend for Shared<FakeMedia> {
    async fn probe_duration(&self, path: &Path) -> anyhow::Result<f64> {
        self.0.probe_duration(path).await
    }

    async fn placeholder_clip(
        &self,
        color: (u8, u8, u8),
        seconds: f64,
        settings: &RenderSettings,
        dest: &Path,
    ) -> anyhow::Result<()> {
        self.0.placeholder_clip(color, seconds, settings, dest).await
    }

    async fn render(&self, job: &RenderJob) -> anyhow::Result<()> {
        self.0.render(job).await
    }

    async fn caption_image(&self, image: &Path, caption: &Caption<'_>, output: &Path) -> anyhow::Result<()> {
        self.0.caption_image(image, caption, output).await
    }
}

#[async_trait]
impl TextProvider for Shared<RoutedProvider> {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        self.0.generate(prompt, max_tokens).await
    }
}

#[async_trait]
impl VoiceSynthesizer for Shared<FakeVoice> {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn synthesize(&self, text: &str, dest_dir: &Path) -> anyhow::Result<Voiceover> {
        self.0.synthesize(text, dest_dir).await
    }
}

#[async_trait]
impl FootageSource for Shared<FakeSource> {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn search(&self, keyword: &str, per_page: usize) -> Result<Vec<FootageCandidate>, ProviderError> {
        self.0.search(keyword, per_page).await
    }

    async fn download(&self, url: &str, dest: &Path) -> anyhow::Result<()> {
        self.0.download(url, dest).await
    }
}

pub struct FakePublisher {
    pub fail: bool,
}

#[async_trait]
impl Publisher for FakePublisher {
    fn name(&self) -> &str {
        "fake-youtube"
    }

    async fn publish(&self, _video: &Path, _thumbnail: Option<&Path>, _metadata: &VideoMetadata) -> anyhow::Result<String> {
        if self.fail {
            anyhow::bail!("HTTP 401 Unauthorized");
        }
        Ok("https://www.youtube.com/watch?v=fake".into())
    }
}

pub fn settings(root: &Path) -> Settings {
    Settings {
        projects_root: root.to_path_buf(),
        ..Settings::default()
    }
}

pub fn config(topic: &str) -> RunConfig {
    RunConfig {
        length_minutes: 1.0,
        output_directory_name: Some("test_run".into()),
        ..RunConfig::new(topic)
    }
}

pub fn components(
    providers: Vec<Box<dyn TextProvider>>,
    voice: Box<dyn VoiceSynthesizer>,
    sources: Vec<Box<dyn FootageSource>>,
    media: Box<dyn MediaBackend>,
) -> Components {
    Components {
        text_providers: providers,
        voice,
        footage_sources: sources,
        media,
        publisher: None,
    }
}

pub fn run_dir(root: &Path) -> PathBuf {
    root.join("test_run")
}
