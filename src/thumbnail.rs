use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{ImageBuffer, Rgb, RgbImage};
use tracing::{info, warn};

use crate::media::{Caption, MediaBackend};

pub const THUMBNAIL_WIDTH: u32 = 1280;
pub const THUMBNAIL_HEIGHT: u32 = 720;
const TITLE_LINE_CHARS: usize = 15;
const TITLE_FONT_SIZE: u32 = 80;

/// Top and bottom colours of the background gradient.
pub fn scheme_colors(scheme: &str) -> ([u8; 3], [u8; 3]) {
    match scheme {
        "trust" => ([0, 123, 255], [0, 80, 180]),
        "growth" => ([40, 167, 69], [20, 120, 40]),
        "energy" => ([255, 193, 7], [220, 160, 0]),
        _ => ([220, 53, 69], [180, 30, 50]),
    }
}

pub fn gradient(width: u32, height: u32, top: [u8; 3], bottom: [u8; 3]) -> RgbImage {
    ImageBuffer::from_fn(width, height, |_, y| {
        let ratio = y as f64 / height as f64;
        let mix = |a: u8, b: u8| (a as f64 * (1.0 - ratio) + b as f64 * ratio) as u8;
        Rgb([mix(top[0], bottom[0]), mix(top[1], bottom[1]), mix(top[2], bottom[2])])
    })
}

/// Upper-cased title broken into lines of at most 15 characters where
/// possible; a longer single word keeps its own line.
pub fn title_lines(title: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for word in title.to_uppercase().split_whitespace() {
        current.push(word.to_string());
        if current.join(" ").chars().count() > TITLE_LINE_CHARS && current.len() > 1 {
            current.pop();
            lines.push(current.join(" "));
            current = vec![word.to_string()];
        }
    }
    if !current.is_empty() {
        lines.push(current.join(" "));
    }
    lines
}

pub struct ThumbnailComposer<'a> {
    media: &'a dyn MediaBackend,
    scheme: &'a str,
    font_file: Option<&'a Path>,
}

impl<'a> ThumbnailComposer<'a> {
    pub fn new(media: &'a dyn MediaBackend, scheme: &'a str, font_file: Option<&'a Path>) -> Self {
        Self {
            media,
            scheme,
            font_file,
        }
    }

    pub async fn compose(&self, title: &str, output: &Path) -> anyhow::Result<PathBuf> {
        let dir = output.parent().context("thumbnail path has no parent directory")?;
        let (top, bottom) = scheme_colors(self.scheme);
        let background = dir.join("background.png");
        gradient(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, top, bottom)
            .save(&background)
            .with_context(|| format!("saving {}", background.display()))?;

        let text_file = dir.join("title.txt");
        tokio::fs::write(&text_file, title_lines(title).join("\n")).await?;

        let caption = Caption {
            text_file: &text_file,
            font_size: TITLE_FONT_SIZE,
            font_file: self.font_file,
        };
        match self.media.caption_image(&background, &caption, output).await {
            Ok(()) => {
                let _ = tokio::fs::remove_file(&background).await;
            }
            Err(e) => {
                warn!("Could not draw thumbnail title ({:#}); keeping plain gradient", e);
                tokio::fs::rename(&background, output).await?;
            }
        }
        let _ = tokio::fs::remove_file(&text_file).await;

        info!("Thumbnail saved to {}", output.display());
        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_wraps_at_fifteen_characters() {
        assert_eq!(
            title_lines("5 Amazing Facts About Sharks"),
            vec!["5 AMAZING FACTS", "ABOUT SHARKS"]
        );
    }

    #[test]
    fn long_word_stays_whole() {
        assert_eq!(title_lines("Incomprehensibilities"), vec!["INCOMPREHENSIBILITIES"]);
    }

    #[test]
    fn gradient_runs_top_to_bottom() {
        let img = gradient(4, 100, [200, 0, 0], [100, 0, 0]);
        assert_eq!(img.get_pixel(0, 0), &Rgb([200, 0, 0]));
        assert_eq!(img.get_pixel(3, 50), &Rgb([150, 0, 0]));
        assert!(img.get_pixel(0, 99)[0] > 100);
    }

    #[test]
    fn unknown_scheme_falls_back_to_urgent() {
        assert_eq!(scheme_colors("neon"), scheme_colors("urgent"));
    }
}
