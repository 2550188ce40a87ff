use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_TAGS: usize = 30;

/// Upload metadata stored next to the video as `metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub titles: Vec<String>,
    pub description: String,
    pub tags: Vec<String>,
}

fn clamp_title(title: String) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title;
    }
    let mut cut: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
    cut.push_str("...");
    cut
}

impl VideoMetadata {
    pub fn compose(topic: &str) -> Self {
        let topic = topic.trim();
        let titles = vec![
            format!("{} - Complete Guide", topic),
            format!("How to Master {}", topic),
            format!("{} Explained Simply", topic),
            format!("The Ultimate {} Tutorial", topic),
        ]
        .into_iter()
        .map(clamp_title)
        .collect();

        let hashtag: String = topic.split_whitespace().collect();
        let description = format!(
            "In this video, you'll learn everything about {topic}.\n\n\
             We cover the essential facts, tips and ideas you need to know.\n\n\
             SUBSCRIBE for more content!\n\n\
             #{hashtag} #facts #didyouknow"
        );

        let mut tags: Vec<String> = Vec::new();
        let variations = [
            topic.to_string(),
            format!("{} explained", topic),
            format!("{} facts", topic),
            format!("{} for beginners", topic),
        ];
        let words = topic
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| w.chars().count() > 3);
        for tag in variations.into_iter().chain(words) {
            if !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                tags.push(tag);
            }
        }
        tags.truncate(MAX_TAGS);

        Self {
            titles,
            description,
            tags,
        }
    }

    /// Title used when publishing.
    pub fn primary_title(&self) -> &str {
        self.titles.first().map(String::as_str).unwrap_or_default()
    }

    pub async fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        info!("Metadata saved to {}", path.display());
        Ok(())
    }

    /// Plain-text sheet for uploading by hand.
    pub fn manual_upload_sheet(&self, video: &Path, thumbnail: Option<&Path>) -> String {
        let rule = "=".repeat(50);
        let mut sheet = String::new();
        let _ = writeln!(sheet, "{rule}\nYOUTUBE UPLOAD METADATA\n{rule}\n");
        let _ = writeln!(sheet, "VIDEO FILE: {}", video.display());
        match thumbnail {
            Some(t) => {
                let _ = writeln!(sheet, "THUMBNAIL: {}\n", t.display());
            }
            None => {
                let _ = writeln!(sheet, "THUMBNAIL: (none)\n");
            }
        }
        let _ = writeln!(sheet, "TITLE:\n{}\n", self.primary_title());
        let _ = writeln!(sheet, "DESCRIPTION:\n{}\n", self.description);
        let _ = writeln!(sheet, "TAGS:\n{}", self.tags.join(", "));
        sheet
    }

    pub async fn write_manual_upload(&self, path: &Path, video: &Path, thumbnail: Option<&Path>) -> anyhow::Result<()> {
        tokio::fs::write(path, self.manual_upload_sheet(video, thumbnail)).await?;
        info!("Metadata for manual upload saved to {}", path.display());
        Ok(())
    }
}
