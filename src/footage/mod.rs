//! Stock footage search and download.
//!
//! Sources are tried in order: the first is primary, later ones only cover
//! a shortfall. When nothing at all can be fetched, solid-colour placeholder
//! clips are rendered so assembly always has input.

pub mod download;
mod pexels;
mod pixabay;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use tracing::{debug, info, warn};

use crate::config::{Credentials, FootageSettings, RenderSettings};
use crate::error::ProviderError;
use crate::media::MediaBackend;
use crate::segments::Segment;

pub use pexels::PexelsSource;
pub use pixabay::PixabaySource;

pub const PLACEHOLDER_SOURCE: &str = "placeholder";
const PLACEHOLDER_COLORS: [(u8, u8, u8); 3] = [(30, 60, 90), (60, 30, 90), (90, 60, 30)];
const STOP_WORDS: [&str; 12] = [
    "about", "that", "will", "your", "with", "from", "this", "what", "have", "they", "into", "than",
];

#[derive(Debug, Clone, PartialEq)]
pub struct VideoFile {
    pub width: u32,
    pub height: u32,
    pub url: String,
}

/// One search hit; `files` keeps the provider's rendition order.
#[derive(Debug, Clone, PartialEq)]
pub struct FootageCandidate {
    pub id: String,
    pub duration: f64,
    pub files: Vec<VideoFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FootageClip {
    pub source: String,
    pub path: PathBuf,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

/// Clips found for one keyword (flat mode) or one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipGroup {
    pub segment: Option<usize>,
    pub label: String,
    pub clips: Vec<FootageClip>,
}

#[derive(Debug, Clone, Default)]
pub struct AcquiredFootage {
    pub groups: Vec<ClipGroup>,
    pub placeholder: bool,
}

impl AcquiredFootage {
    /// Clips in narrative order: group by group.
    pub fn clips(&self) -> impl Iterator<Item = &FootageClip> {
        self.groups.iter().flat_map(|g| g.clips.iter())
    }

    pub fn clip_count(&self) -> usize {
        self.groups.iter().map(|g| g.clips.len()).sum()
    }
}

#[async_trait]
pub trait FootageSource: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, keyword: &str, per_page: usize) -> Result<Vec<FootageCandidate>, ProviderError>;

    /// Must leave either a complete file at `dest` or nothing.
    async fn download(&self, url: &str, dest: &Path) -> anyhow::Result<()>;
}

/// First rendition meeting `min_height`; otherwise the smallest one offered.
/// Ties keep the provider's order. Renditions without a known height
/// (streaming playlists) are never picked.
pub fn select_file(files: &[VideoFile], min_height: u32) -> Option<&VideoFile> {
    let sized = || files.iter().filter(|f| f.height > 0);
    sized()
        .find(|f| f.height >= min_height)
        .or_else(|| sized().min_by_key(|f| f.height))
}

/// Search terms taken from the topic when no segments or overrides exist.
pub fn topic_keywords(topic: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for word in topic.split_whitespace() {
        let word: String = word
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '-')
            .collect::<String>()
            .to_lowercase();
        if word.chars().count() > 3 && !STOP_WORDS.contains(&word.as_str()) && !keywords.contains(&word) {
            keywords.push(word);
        }
    }
    keywords.truncate(3);
    if keywords.is_empty() && !topic.trim().is_empty() {
        keywords.push(topic.trim().to_string());
    }
    keywords
}

fn slug(keyword: &str) -> String {
    keyword
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// Configured stock sources in fallback order; ones without a key are absent.
pub fn footage_sources(credentials: &Credentials) -> Vec<Box<dyn FootageSource>> {
    let client = reqwest::Client::new();
    let mut sources: Vec<Box<dyn FootageSource>> = Vec::new();
    match &credentials.pexels_api_key {
        Some(key) => sources.push(Box::new(PexelsSource::new(client.clone(), key.clone()))),
        None => warn!("PEXELS_API_KEY not set; primary footage source disabled"),
    }
    match &credentials.pixabay_api_key {
        Some(key) => sources.push(Box::new(PixabaySource::new(client, key.clone()))),
        None => debug!("PIXABAY_API_KEY not set; secondary footage source disabled"),
    }
    sources
}

pub struct FootageAcquirer<'a> {
    sources: &'a [Box<dyn FootageSource>],
    media: &'a dyn MediaBackend,
    settings: &'a FootageSettings,
    render: &'a RenderSettings,
    dest_dir: &'a Path,
    claimed: Mutex<HashSet<String>>,
}

impl<'a> FootageAcquirer<'a> {
    pub fn new(
        sources: &'a [Box<dyn FootageSource>],
        media: &'a dyn MediaBackend,
        settings: &'a FootageSettings,
        render: &'a RenderSettings,
        dest_dir: &'a Path,
    ) -> Self {
        Self {
            sources,
            media,
            settings,
            render,
            dest_dir,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// Returns false when another task already took this item.
    fn claim(&self, key: String) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key)
    }

    /// Download up to `want` clips for `keyword` from one source. Errors are
    /// logged and count as "nothing found".
    async fn fetch(&self, source: &dyn FootageSource, keyword: &str, want: usize) -> Vec<FootageClip> {
        if want == 0 {
            return Vec::new();
        }
        info!("Searching {} for '{}' (want {})", source.name(), keyword, want);
        let per_page = self.settings.results_per_query.max(want);
        let candidates = match source.search(keyword, per_page).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Footage search failed: {}", e);
                return Vec::new();
            }
        };

        let mut clips = Vec::new();
        for candidate in candidates {
            if clips.len() >= want {
                break;
            }
            let Some(file) = select_file(&candidate.files, self.settings.min_height) else {
                continue;
            };
            if !self.claim(format!("{}:{}", source.name(), candidate.id)) {
                debug!("Skipping duplicate {} item {}", source.name(), candidate.id);
                continue;
            }
            if file.height < self.settings.min_height {
                debug!(
                    "No HD rendition for {} item {}; using {}p",
                    source.name(),
                    candidate.id,
                    file.height
                );
            }

            let dest = self
                .dest_dir
                .join(format!("{}_{}_{}.mp4", source.name(), slug(keyword), candidate.id));
            match source.download(&file.url, &dest).await {
                Ok(()) => {
                    info!("Downloaded {}", dest.display());
                    clips.push(FootageClip {
                        source: source.name().to_string(),
                        path: dest,
                        duration: candidate.duration,
                        width: file.width,
                        height: file.height,
                    });
                }
                Err(e) => warn!("Download of {} item {} failed: {:#}", source.name(), candidate.id, e),
            }
        }
        clips
    }

    /// Per keyword from the primary source, then later sources for each
    /// keyword still under its quota.
    pub async fn acquire_flat(&self, keywords: &[String]) -> AcquiredFootage {
        let per_keyword = self.settings.clips_per_keyword;
        let mut groups: Vec<ClipGroup> = match self.sources.first() {
            Some(primary) => {
                stream::iter(keywords)
                    .map(|keyword| async move {
                        ClipGroup {
                            segment: None,
                            label: keyword.clone(),
                            clips: self.fetch(primary.as_ref(), keyword, per_keyword).await,
                        }
                    })
                    .buffered(self.settings.workers.max(1))
                    .collect()
                    .await
            }
            None => keywords
                .iter()
                .map(|keyword| ClipGroup {
                    segment: None,
                    label: keyword.clone(),
                    clips: Vec::new(),
                })
                .collect(),
        };

        let target = keywords.len() * per_keyword;
        for source in self.sources.iter().skip(1) {
            let mut shortfall = target.saturating_sub(groups.iter().map(|g| g.clips.len()).sum());
            if shortfall == 0 {
                break;
            }
            info!("Primary footage short by {} clips; trying {}", shortfall, source.name());
            for group in groups.iter_mut() {
                if shortfall == 0 {
                    break;
                }
                let deficit = per_keyword.saturating_sub(group.clips.len()).min(shortfall);
                if deficit == 0 {
                    continue;
                }
                let found = self.fetch(source.as_ref(), &group.label, deficit).await;
                shortfall -= found.len().min(shortfall);
                group.clips.extend(found);
            }
        }

        self.finish(groups).await
    }

    /// Per segment: every keyword on the primary source until the quota is
    /// met, then the same on later sources. Clips stay grouped by segment.
    pub async fn acquire_segments(&self, segments: &[Segment]) -> AcquiredFootage {
        let quota = self.settings.clips_per_segment;
        let groups: Vec<ClipGroup> = stream::iter(segments)
            .map(|segment| async move {
                let mut clips: Vec<FootageClip> = Vec::new();
                'sources: for source in self.sources {
                    for keyword in &segment.keywords {
                        let need = quota.saturating_sub(clips.len());
                        if need == 0 {
                            break 'sources;
                        }
                        clips.extend(self.fetch(source.as_ref(), keyword, need).await);
                    }
                }
                info!(
                    "Segment {} has {}/{} clips",
                    segment.ordinal,
                    clips.len(),
                    quota
                );
                ClipGroup {
                    segment: Some(segment.ordinal),
                    label: segment.summary.clone(),
                    clips,
                }
            })
            .buffered(self.settings.workers.max(1))
            .collect()
            .await;

        self.finish(groups).await
    }

    async fn finish(&self, groups: Vec<ClipGroup>) -> AcquiredFootage {
        let acquired = AcquiredFootage {
            groups,
            placeholder: false,
        };
        if acquired.clip_count() > 0 {
            info!("Acquired {} footage clips", acquired.clip_count());
            return acquired;
        }

        warn!("No stock footage could be acquired; generating placeholder clips");
        AcquiredFootage {
            groups: vec![ClipGroup {
                segment: None,
                label: PLACEHOLDER_SOURCE.to_string(),
                clips: self.placeholders().await,
            }],
            placeholder: true,
        }
    }

    async fn placeholders(&self) -> Vec<FootageClip> {
        let mut clips = Vec::new();
        for (i, color) in PLACEHOLDER_COLORS.iter().enumerate() {
            let dest = self.dest_dir.join(format!("placeholder_{}.mp4", i + 1));
            match self
                .media
                .placeholder_clip(*color, self.render.placeholder_seconds, self.render, &dest)
                .await
            {
                Ok(()) => clips.push(FootageClip {
                    source: PLACEHOLDER_SOURCE.to_string(),
                    path: dest,
                    duration: self.render.placeholder_seconds,
                    width: self.render.width,
                    height: self.render.height,
                }),
                Err(e) => warn!("Could not render placeholder clip {}: {:#}", i + 1, e),
            }
        }
        clips
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(height: u32, url: &str) -> VideoFile {
        VideoFile {
            width: height * 16 / 9,
            height,
            url: url.to_string(),
        }
    }

    #[test]
    fn prefers_first_hd_rendition_in_provider_order() {
        let files = vec![file(360, "sd"), file(1080, "fhd"), file(720, "hd")];
        assert_eq!(select_file(&files, 720).unwrap().url, "fhd");
    }

    #[test]
    fn falls_back_to_lowest_sd_rendition() {
        let files = vec![file(540, "qhd"), file(360, "sd-a"), file(360, "sd-b")];
        assert_eq!(select_file(&files, 720).unwrap().url, "sd-a");
    }

    #[test]
    fn renditions_without_height_are_never_selected() {
        let files = vec![file(0, "playlist.m3u8"), file(360, "sd.mp4")];
        assert_eq!(select_file(&files, 720).unwrap().url, "sd.mp4");
        assert!(select_file(&[file(0, "playlist.m3u8")], 720).is_none());
    }

    #[test]
    fn no_renditions_selects_nothing() {
        assert!(select_file(&[], 720).is_none());
    }

    #[test]
    fn topic_keywords_skip_short_and_stop_words() {
        assert_eq!(
            topic_keywords("5 Amazing Facts About Sharks That Will Blow Your Mind"),
            vec!["amazing", "facts", "sharks"]
        );
    }

    #[test]
    fn topic_keywords_fall_back_to_whole_topic() {
        assert_eq!(topic_keywords("AI is fun"), vec!["AI is fun"]);
    }

    #[test]
    fn slug_is_filename_safe() {
        assert_eq!(slug("Great White/Shark"), "great_white_shark");
    }
}
