mod args;

use anyhow::Context;
use clap::Parser;
use dialoguer::{Confirm, Input, Select};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use args::{Args, Command, GenerationArgs};
use faceless::config::{Credentials, ProviderPreference, RunConfig, Settings};
use faceless::pipeline::{Pipeline, RunReport};
use faceless::schedule::{GAP_BETWEEN_VIDEOS, parse_daily_time, run_daily};
use faceless::trends::TrendFinder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let credentials = Credentials::from_env();

    match args.command {
        Command::Run {
            topic,
            project,
            options,
        } => {
            let config = options.run_config(topic, project);
            run_once(config, options.settings(credentials)).await
        }
        Command::Suggest { niche, region, count } => {
            let topics = TrendFinder::new(reqwest::Client::new())
                .suggest(&niche, &region, count)
                .await;
            for (i, topic) in topics.iter().enumerate() {
                println!("{}. {}", i + 1, topic);
            }
            Ok(())
        }
        Command::Interactive { options } => {
            let config = prompt_run_config(&options)?;
            run_once(config, options.settings(credentials)).await
        }
        Command::Schedule {
            time,
            videos_per_day,
            niche,
            region,
            options,
        } => {
            let at = parse_daily_time(&time).map_err(anyhow::Error::msg)?;
            run_daily(at, videos_per_day, GAP_BETWEEN_VIDEOS, move |i| {
                let options = options.clone();
                let credentials = credentials.clone();
                let niche = niche.clone();
                let region = region.clone();
                async move {
                    let topics = TrendFinder::new(reqwest::Client::new())
                        .suggest(&niche, &region, videos_per_day.max(1))
                        .await;
                    let topic = topics
                        .get(i % topics.len().max(1))
                        .cloned()
                        .context("no topic available")?;
                    info!("Scheduled topic: {}", topic);
                    let report = Pipeline::new(options.run_config(topic, None), options.settings(credentials))
                        .run()
                        .await?;
                    log_report(&report);
                    Ok(())
                }
            })
            .await;
            Ok(())
        }
    }
}

async fn run_once(config: RunConfig, settings: Settings) -> anyhow::Result<()> {
    match Pipeline::new(config, settings).run().await {
        Ok(report) => {
            log_report(&report);
            Ok(())
        }
        Err(e) => {
            error!("Run failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn log_report(report: &RunReport) {
    info!("Video: {}", report.video.display());
    if let Some(thumbnail) = &report.thumbnail {
        info!("Thumbnail: {}", thumbnail.display());
    }
    if let Some(metadata) = &report.metadata {
        info!("Metadata: {}", metadata.display());
    }
    if let Some(url) = &report.published_url {
        info!("Published: {}", url);
    }
    if report.degraded.is_empty() {
        info!("All stages completed");
    } else {
        warn!("Completed with {} degraded stage(s):", report.degraded.len());
        for stage in &report.degraded {
            warn!("  - {}", stage);
        }
    }
}

fn prompt_run_config(options: &GenerationArgs) -> anyhow::Result<RunConfig> {
    let topic: String = Input::new().with_prompt("Video topic").interact_text()?;
    let length: f64 = Input::new()
        .with_prompt("Length in minutes")
        .default(options.length)
        .interact_text()?;
    let keywords: String = Input::new()
        .with_prompt("Footage keywords (comma-separated, empty for automatic)")
        .allow_empty(true)
        .default(options.keywords.join(","))
        .interact_text()?;

    let providers = ["auto", "ollama", "groq", "gemini", "openai"];
    let choice = Select::new()
        .with_prompt("AI provider")
        .items(&providers)
        .default(0)
        .interact()?;
    let ai_provider: ProviderPreference = providers[choice].parse().map_err(anyhow::Error::msg)?;

    let upload = Confirm::new()
        .with_prompt("Upload to YouTube when done?")
        .default(options.upload)
        .interact()?;

    let mut options = options.clone();
    options.length = length;
    options.keywords = keywords.split(',').map(str::to_string).collect();
    options.ai_provider = ai_provider;
    options.upload = upload;
    Ok(options.run_config(topic, None))
}
