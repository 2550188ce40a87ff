use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Local;

/// Text providers the pipeline knows how to call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Ollama,
    Groq,
    Gemini,
    Openai,
}

pub struct ProviderEndpoint {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl ProviderKind {
    /// Order used by `auto`: free local model first, then hosted ones.
    pub const AUTO_ORDER: [ProviderKind; 4] = [
        ProviderKind::Ollama,
        ProviderKind::Groq,
        ProviderKind::Gemini,
        ProviderKind::Openai,
    ];

    pub fn endpoint(&self) -> ProviderEndpoint {
        match self {
            ProviderKind::Ollama => ProviderEndpoint {
                api_url: "http://localhost:11434",
                model: "llama3.1:8b",
                env_var: "OLLAMA_URL",
            },
            ProviderKind::Groq => ProviderEndpoint {
                api_url: "https://api.groq.com/openai/v1/chat/completions",
                model: "llama-3.3-70b-versatile",
                env_var: "GROQ_API_KEY",
            },
            ProviderKind::Gemini => ProviderEndpoint {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-1.5-flash",
                env_var: "GEMINI_API_KEY",
            },
            ProviderKind::Openai => ProviderEndpoint {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-4o-mini",
                env_var: "OPENAI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "Ollama",
            ProviderKind::Groq => "Groq",
            ProviderKind::Gemini => "Gemini",
            ProviderKind::Openai => "OpenAI",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(ProviderKind::Ollama),
            "groq" => Ok(ProviderKind::Groq),
            "gemini" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::Openai),
            other => Err(format!("unknown AI provider '{}'", other)),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `auto`, or a comma-separated list of providers to try first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ProviderPreference {
    #[default]
    Auto,
    Prefer(Vec<ProviderKind>),
}

impl ProviderPreference {
    /// Preferred providers first, then the remaining auto order.
    pub fn resolve(&self) -> Vec<ProviderKind> {
        match self {
            ProviderPreference::Auto => ProviderKind::AUTO_ORDER.to_vec(),
            ProviderPreference::Prefer(first) => {
                let mut order: Vec<ProviderKind> = Vec::new();
                for kind in first.iter().chain(ProviderKind::AUTO_ORDER.iter()) {
                    if !order.contains(kind) {
                        order.push(*kind);
                    }
                }
                order
            }
        }
    }
}

impl FromStr for ProviderPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("auto") {
            return Ok(ProviderPreference::Auto);
        }
        let kinds = s
            .split(',')
            .filter(|p| !p.trim().is_empty())
            .map(ProviderKind::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProviderPreference::Prefer(kinds))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoiceEngine {
    #[default]
    Edge,
    Piper,
}

impl VoiceEngine {
    pub fn default_voice(&self) -> &'static str {
        match self {
            VoiceEngine::Edge => "en-US-GuyNeural",
            VoiceEngine::Piper => "./en_US-amy-medium.onnx",
        }
    }
}

impl FromStr for VoiceEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edge" | "edge-tts" => Ok(VoiceEngine::Edge),
            "piper" => Ok(VoiceEngine::Piper),
            other => Err(format!("unknown voice engine '{}'", other)),
        }
    }
}

/// Inputs of a single run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub topic: String,
    pub length_minutes: f64,
    pub voice_engine: VoiceEngine,
    pub voice_id: Option<String>,
    pub ai_provider: ProviderPreference,
    /// Overrides segment-based footage search when set.
    pub footage_keywords: Option<Vec<String>>,
    pub output_directory_name: Option<String>,
    pub upload: bool,
}

impl RunConfig {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            length_minutes: 8.0,
            voice_engine: VoiceEngine::default(),
            voice_id: None,
            ai_provider: ProviderPreference::Auto,
            footage_keywords: None,
            output_directory_name: None,
            upload: false,
        }
    }

    pub fn voice(&self) -> &str {
        self.voice_id
            .as_deref()
            .unwrap_or_else(|| self.voice_engine.default_voice())
    }
}

/// Credentials and endpoints, read from the environment once at startup.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    pub ollama_url: Option<String>,
    pub groq_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub pexels_api_key: Option<String>,
    pub pixabay_api_key: Option<String>,
    pub youtube_access_token: Option<String>,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            ollama_url: env_opt("OLLAMA_URL"),
            groq_api_key: env_opt("GROQ_API_KEY"),
            gemini_api_key: env_opt("GEMINI_API_KEY"),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            pexels_api_key: env_opt("PEXELS_API_KEY"),
            pixabay_api_key: env_opt("PIXABAY_API_KEY"),
            youtube_access_token: env_opt("YOUTUBE_ACCESS_TOKEN"),
        }
    }

    pub fn api_key(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Ollama => None,
            ProviderKind::Groq => self.groq_api_key.as_deref(),
            ProviderKind::Gemini => self.gemini_api_key.as_deref(),
            ProviderKind::Openai => self.openai_api_key.as_deref(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub pixel_format: String,
    pub font_file: Option<PathBuf>,
    pub overlay_font_size: u32,
    /// Horizontal pixel budget an overlay line may occupy.
    pub overlay_wrap_px: u32,
    pub placeholder_seconds: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            video_codec: "libx264".into(),
            audio_codec: "aac".into(),
            pixel_format: "yuv420p".into(),
            font_file: None,
            overlay_font_size: 64,
            overlay_wrap_px: 1500,
            placeholder_seconds: 30.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FootageSettings {
    pub min_height: u32,
    pub clips_per_keyword: usize,
    pub clips_per_segment: usize,
    pub results_per_query: usize,
    pub workers: usize,
}

impl Default for FootageSettings {
    fn default() -> Self {
        Self {
            min_height: 720,
            clips_per_keyword: 3,
            clips_per_segment: 2,
            results_per_query: 5,
            workers: 3,
        }
    }
}

/// Everything a pipeline needs besides the run inputs.
#[derive(Clone, Debug)]
pub struct Settings {
    pub projects_root: PathBuf,
    pub credentials: Credentials,
    pub render: RenderSettings,
    pub footage: FootageSettings,
    pub youtube_privacy: String,
    pub youtube_category: String,
    pub thumbnail_scheme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            projects_root: PathBuf::from("projects"),
            credentials: Credentials::default(),
            render: RenderSettings::default(),
            footage: FootageSettings::default(),
            youtube_privacy: "private".into(),
            youtube_category: "27".into(),
            thumbnail_scheme: "urgent".into(),
        }
    }
}

/// Per-run directory tree. Nothing outside it is written during a run.
#[derive(Clone, Debug)]
pub struct RunLayout {
    pub root: PathBuf,
    pub scripts: PathBuf,
    pub voiceovers: PathBuf,
    pub footage: PathBuf,
    pub output: PathBuf,
    pub thumbnails: PathBuf,
    pub metadata: PathBuf,
}

impl RunLayout {
    pub fn new(projects_root: &Path, name: Option<&str>) -> Self {
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("video_{}", Local::now().format("%Y%m%d_%H%M%S")));
        let root = projects_root.join(name);
        Self {
            scripts: root.join("scripts"),
            voiceovers: root.join("voiceovers"),
            footage: root.join("footage"),
            output: root.join("output"),
            thumbnails: root.join("thumbnails"),
            metadata: root.join("metadata"),
            root,
        }
    }

    pub async fn create(&self) -> std::io::Result<()> {
        for dir in [
            &self.scripts,
            &self.voiceovers,
            &self.footage,
            &self.output,
            &self.thumbnails,
            &self.metadata,
        ] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    pub fn script_path(&self) -> PathBuf {
        self.scripts.join("script.txt")
    }

    pub fn final_video_path(&self) -> PathBuf {
        self.output.join("final_video.mp4")
    }

    pub fn thumbnail_path(&self) -> PathBuf {
        self.thumbnails.join("thumbnail.png")
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.metadata.join("metadata.json")
    }
}
