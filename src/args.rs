use std::path::PathBuf;

use clap::{Parser, Subcommand};

use faceless::config::{Credentials, ProviderPreference, RenderSettings, RunConfig, Settings, VoiceEngine};

#[derive(Parser, Debug)]
#[clap(name = "faceless", version, about = "Turn a topic into a narrated stock-footage video")]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Produce one video for a topic
    Run {
        #[clap(long)]
        topic: String,

        /// Name of the run directory under the projects root
        #[clap(long)]
        project: Option<String>,

        #[clap(flatten)]
        options: GenerationArgs,
    },

    /// Print trending topic ideas
    Suggest {
        #[clap(long, default_value = "amazing facts")]
        niche: String,

        #[clap(long, default_value = "US")]
        region: String,

        #[clap(long, default_value_t = 5)]
        count: usize,
    },

    /// Prompt for the run inputs one by one
    Interactive {
        #[clap(flatten)]
        options: GenerationArgs,
    },

    /// Produce videos on suggested topics every day
    Schedule {
        /// Local time of day, HH:MM
        #[clap(long, default_value = "10:00")]
        time: String,

        #[clap(long, default_value_t = 1)]
        videos_per_day: usize,

        #[clap(long, default_value = "amazing facts")]
        niche: String,

        #[clap(long, default_value = "US")]
        region: String,

        #[clap(flatten)]
        options: GenerationArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerationArgs {
    /// Target narration length in minutes
    #[clap(long, default_value_t = 8.0)]
    pub length: f64,

    /// Comma-separated footage keywords; skips segment-based search
    #[clap(long, value_delimiter = ',')]
    pub keywords: Vec<String>,

    /// `auto` or a comma-separated provider list (ollama, groq, gemini, openai)
    #[clap(long, default_value = "auto")]
    pub ai_provider: ProviderPreference,

    #[clap(long, default_value = "edge")]
    pub voice_engine: VoiceEngine,

    /// Edge voice name or Piper model path
    #[clap(long)]
    pub voice: Option<String>,

    #[clap(long)]
    pub upload: bool,

    #[clap(long, default_value = "projects")]
    pub projects_root: PathBuf,

    /// urgent, trust, growth or energy
    #[clap(long, default_value = "urgent")]
    pub thumbnail_scheme: String,

    /// Font for overlays and thumbnail text
    #[clap(long)]
    pub font_file: Option<PathBuf>,
}

impl GenerationArgs {
    pub fn run_config(&self, topic: String, project: Option<String>) -> RunConfig {
        let keywords: Vec<String> = self
            .keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        RunConfig {
            length_minutes: self.length,
            voice_engine: self.voice_engine,
            voice_id: self.voice.clone(),
            ai_provider: self.ai_provider.clone(),
            footage_keywords: (!keywords.is_empty()).then_some(keywords),
            output_directory_name: project,
            upload: self.upload,
            ..RunConfig::new(topic)
        }
    }

    pub fn settings(&self, credentials: Credentials) -> Settings {
        Settings {
            projects_root: self.projects_root.clone(),
            credentials,
            render: RenderSettings {
                font_file: self.font_file.clone(),
                ..RenderSettings::default()
            },
            thumbnail_scheme: self.thumbnail_scheme.clone(),
            ..Settings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags_map_onto_run_config() {
        let args = Args::parse_from([
            "faceless",
            "run",
            "--topic",
            "5 Investment Mistakes",
            "--length",
            "2",
            "--keywords",
            "money, stock market",
            "--ai-provider",
            "groq",
            "--project",
            "invest",
        ]);
        let Command::Run { topic, project, options } = args.command else {
            panic!("expected run");
        };
        let config = options.run_config(topic, project);
        assert_eq!(config.length_minutes, 2.0);
        assert_eq!(
            config.footage_keywords,
            Some(vec!["money".to_string(), "stock market".to_string()])
        );
        assert_eq!(config.output_directory_name.as_deref(), Some("invest"));
        assert_eq!(config.voice(), "en-US-GuyNeural");
        assert!(!config.upload);
    }

    #[test]
    fn no_keywords_means_segment_search() {
        let args = Args::parse_from(["faceless", "run", "--topic", "Mars"]);
        let Command::Run { topic, project, options } = args.command else {
            panic!("expected run");
        };
        assert!(options.run_config(topic, project).footage_keywords.is_none());
    }
}
