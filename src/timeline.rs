//! Duration matching between narration and footage.
//!
//! The narration length `D` is fixed. Footage is looped as a whole sequence
//! until it covers `D`, concatenated in order, and cut at exactly `D`. Only a
//! trailing suffix is ever removed.

use thiserror::Error;

/// Tolerance when comparing accumulated clip time against the narration.
pub const DURATION_EPSILON: f64 = 1e-6;
/// An overlay starts this long before its interval boundary.
pub const OVERLAY_LEAD_SECONDS: f64 = 2.5;
pub const OVERLAY_SECONDS: f64 = 5.0;

#[derive(Error, Debug, PartialEq)]
pub enum TimelineError {
    #[error("no footage with positive duration")]
    NoFootage,

    #[error("invalid narration duration {0}")]
    InvalidDuration(f64),
}

/// One cut of a source clip placed on the output track.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    /// Index into the clip list the timeline was planned from.
    pub clip: usize,
    pub in_time: f64,
    pub out_time: f64,
    /// Position of this cut on the output track.
    pub track_start: f64,
}

impl TimelineEntry {
    pub fn duration(&self) -> f64 {
        self.out_time - self.in_time
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayPlacement {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

impl OverlayPlacement {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub duration: f64,
    /// How many times the clip sequence was repeated before the cut.
    pub loops: usize,
    pub entries: Vec<TimelineEntry>,
    pub overlays: Vec<OverlayPlacement>,
}

impl Timeline {
    pub fn track_duration(&self) -> f64 {
        self.entries.iter().map(TimelineEntry::duration).sum()
    }
}

pub fn loop_count(audio_duration: f64, footage_total: f64) -> usize {
    if footage_total < audio_duration {
        (audio_duration / footage_total).ceil() as usize
    } else {
        1
    }
}

/// Lay clips end to end, repeating the whole sequence as needed, and cut at
/// `audio_duration`.
pub fn plan_track(
    audio_duration: f64,
    clip_durations: &[f64],
) -> Result<(usize, Vec<TimelineEntry>), TimelineError> {
    if !audio_duration.is_finite() || audio_duration <= 0.0 {
        return Err(TimelineError::InvalidDuration(audio_duration));
    }
    let total: f64 = clip_durations.iter().filter(|d| **d > 0.0).sum();
    if total <= 0.0 {
        return Err(TimelineError::NoFootage);
    }

    let loops = loop_count(audio_duration, total);
    let mut entries = Vec::new();
    let mut position = 0.0_f64;

    'outer: for _ in 0..loops {
        for (clip, &duration) in clip_durations.iter().enumerate() {
            if duration <= 0.0 {
                continue;
            }
            let remaining = audio_duration - position;
            if remaining <= DURATION_EPSILON {
                break 'outer;
            }
            let take = duration.min(remaining);
            entries.push(TimelineEntry {
                clip,
                in_time: 0.0,
                out_time: take,
                track_start: position,
            });
            position += take;
        }
    }

    Ok((loops, entries))
}

/// Spread key points evenly: `n` points split the track into `n + 1` equal
/// intervals and each window straddles one interval boundary.
pub fn schedule_overlays(audio_duration: f64, key_points: &[String]) -> Vec<OverlayPlacement> {
    if key_points.is_empty() || audio_duration <= 0.0 {
        return Vec::new();
    }
    let interval = audio_duration / (key_points.len() + 1) as f64;

    key_points
        .iter()
        .enumerate()
        .filter_map(|(i, text)| {
            let boundary = (i + 1) as f64 * interval;
            let start = (boundary - OVERLAY_LEAD_SECONDS).max(0.0);
            (start < audio_duration).then(|| OverlayPlacement {
                text: text.clone(),
                start,
                duration: OVERLAY_SECONDS,
            })
        })
        .collect()
}

pub fn build_timeline(
    audio_duration: f64,
    clip_durations: &[f64],
    key_points: &[String],
) -> Result<Timeline, TimelineError> {
    let (loops, entries) = plan_track(audio_duration, clip_durations)?;
    Ok(Timeline {
        duration: audio_duration,
        loops,
        entries,
        overlays: schedule_overlays(audio_duration, key_points),
    })
}
