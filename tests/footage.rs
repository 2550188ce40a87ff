mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::*;
use faceless::config::{FootageSettings, RenderSettings};
use faceless::footage::{FootageAcquirer, FootageSource, PLACEHOLDER_SOURCE};
use faceless::segments::Segment;

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn segment(ordinal: usize, words: &[&str]) -> Segment {
    Segment {
        ordinal,
        summary: format!("segment {}", ordinal),
        keywords: keywords(words),
    }
}

#[tokio::test]
async fn primary_quota_per_keyword_then_secondary_shortfall() {
    let dir = tempfile::tempdir().unwrap();
    let primary = Arc::new(
        FakeSource::new("pexels")
            .with(
                "ocean",
                vec![
                    candidate("1", 10.0, &[1080]),
                    candidate("2", 10.0, &[1080]),
                    candidate("3", 10.0, &[1080]),
                    candidate("4", 10.0, &[1080]),
                ],
            )
            .with("reef", vec![candidate("5", 10.0, &[720])]),
    );
    let secondary = Arc::new(FakeSource::new("pixabay").with(
        "reef",
        vec![
            candidate("a", 7.0, &[1080]),
            candidate("b", 7.0, &[1080]),
            candidate("c", 7.0, &[1080]),
        ],
    ));
    let sources: Vec<Box<dyn FootageSource>> = vec![
        Box::new(Shared(primary.clone())),
        Box::new(Shared(secondary.clone())),
    ];
    let media = FakeMedia::default();
    let settings = FootageSettings::default();
    let render = RenderSettings::default();

    let footage = FootageAcquirer::new(&sources, &media, &settings, &render, dir.path())
        .acquire_flat(&keywords(&["ocean", "reef"]))
        .await;

    assert!(!footage.placeholder);
    assert_eq!(footage.groups[0].clips.len(), 3);
    assert!(footage.groups[0].clips.iter().all(|c| c.source == "pexels"));
    // reef: 1 from primary, shortfall of 2 filled by the secondary source
    let reef: Vec<&str> = footage.groups[1].clips.iter().map(|c| c.source.as_str()).collect();
    assert_eq!(reef, vec!["pexels", "pixabay", "pixabay"]);
    assert_eq!(secondary.searched(), vec!["reef"]);
    assert!(footage.clips().all(|c| c.path.exists()));
}

#[tokio::test]
async fn secondary_only_fills_keywords_under_quota() {
    let dir = tempfile::tempdir().unwrap();
    let primary = FakeSource::new("pexels").with(
        "ocean",
        vec![
            candidate("1", 10.0, &[1080]),
            candidate("2", 10.0, &[1080]),
            candidate("3", 10.0, &[1080]),
        ],
    );
    let secondary = Arc::new(
        FakeSource::new("pixabay")
            .with(
                "ocean",
                vec![
                    candidate("o1", 8.0, &[1080]),
                    candidate("o2", 8.0, &[1080]),
                    candidate("o3", 8.0, &[1080]),
                ],
            )
            .with(
                "reef",
                vec![
                    candidate("r1", 8.0, &[1080]),
                    candidate("r2", 8.0, &[1080]),
                    candidate("r3", 8.0, &[1080]),
                ],
            ),
    );
    let sources: Vec<Box<dyn FootageSource>> = vec![Box::new(primary), Box::new(Shared(secondary.clone()))];
    let media = FakeMedia::default();
    let settings = FootageSettings::default();
    let render = RenderSettings::default();

    let footage = FootageAcquirer::new(&sources, &media, &settings, &render, dir.path())
        .acquire_flat(&keywords(&["ocean", "reef"]))
        .await;

    let counts: Vec<usize> = footage.groups.iter().map(|g| g.clips.len()).collect();
    assert_eq!(counts, vec![3, 3]);
    assert!(footage.groups[1].clips.iter().all(|c| c.source == "pixabay"));
    assert_eq!(secondary.searched(), vec!["reef"]);
}

#[tokio::test]
async fn full_primary_quota_never_touches_secondary() {
    let dir = tempfile::tempdir().unwrap();
    let primary = FakeSource::new("pexels").with(
        "city",
        vec![
            candidate("1", 10.0, &[1080]),
            candidate("2", 10.0, &[1080]),
            candidate("3", 10.0, &[1080]),
        ],
    );
    let secondary = Arc::new(FakeSource::new("pixabay"));
    let sources: Vec<Box<dyn FootageSource>> = vec![Box::new(primary), Box::new(Shared(secondary.clone()))];
    let media = FakeMedia::default();
    let settings = FootageSettings::default();
    let render = RenderSettings::default();

    let footage = FootageAcquirer::new(&sources, &media, &settings, &render, dir.path())
        .acquire_flat(&keywords(&["city"]))
        .await;

    assert_eq!(footage.clip_count(), 3);
    assert!(secondary.searched().is_empty());
}

#[tokio::test]
async fn same_item_is_downloaded_once() {
    let dir = tempfile::tempdir().unwrap();
    let shared_hit = candidate("42", 10.0, &[1080]);
    let primary = Arc::new(
        FakeSource::new("pexels")
            .with("shark", vec![shared_hit.clone()])
            .with("ocean", vec![shared_hit, candidate("43", 10.0, &[1080])]),
    );
    let sources: Vec<Box<dyn FootageSource>> = vec![Box::new(Shared(primary.clone()))];
    let media = FakeMedia::default();
    let settings = FootageSettings::default();
    let render = RenderSettings::default();

    let footage = FootageAcquirer::new(&sources, &media, &settings, &render, dir.path())
        .acquire_flat(&keywords(&["shark", "ocean"]))
        .await;

    assert_eq!(footage.clip_count(), 2);
    assert_eq!(primary.downloads.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn segments_keep_narrative_order_and_quota() {
    let dir = tempfile::tempdir().unwrap();
    let primary = Arc::new(
        FakeSource::new("pexels")
            .with("volcano", vec![candidate("v1", 10.0, &[1080]), candidate("v2", 10.0, &[1080])])
            .with("lava", vec![candidate("l1", 10.0, &[1080])])
            .with("ash", vec![candidate("a1", 10.0, &[360, 240])]),
    );
    let sources: Vec<Box<dyn FootageSource>> = vec![Box::new(Shared(primary.clone()))];
    let media = FakeMedia::default();
    let settings = FootageSettings::default();
    let render = RenderSettings::default();

    let footage = FootageAcquirer::new(&sources, &media, &settings, &render, dir.path())
        .acquire_segments(&[segment(1, &["volcano", "lava"]), segment(2, &["ash", "lava"])])
        .await;

    assert_eq!(footage.groups.len(), 2);
    assert_eq!(footage.groups[0].segment, Some(1));
    assert_eq!(footage.groups[1].segment, Some(2));
    // quota met by the first keyword, so "lava" is not needed for segment 1
    assert_eq!(footage.groups[0].clips.len(), 2);
    // segment 2 falls back to the lowest SD rendition for "ash"
    assert_eq!(footage.groups[1].clips[0].height, 240);
    assert_eq!(footage.groups[1].clips.len(), 2);
    assert!(primary.downloads.lock().unwrap().iter().any(|u| u.ends_with("/240.mp4")));
}

#[tokio::test]
async fn failing_search_is_treated_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let broken = FakeSource {
        fail_search: true,
        ..FakeSource::new("pexels")
    };
    let working = FakeSource::new("pixabay").with("moon", vec![candidate("m", 12.0, &[1080])]);
    let sources: Vec<Box<dyn FootageSource>> = vec![Box::new(broken), Box::new(working)];
    let media = FakeMedia::default();
    let settings = FootageSettings::default();
    let render = RenderSettings::default();

    let footage = FootageAcquirer::new(&sources, &media, &settings, &render, dir.path())
        .acquire_flat(&keywords(&["moon"]))
        .await;

    assert!(!footage.placeholder);
    assert_eq!(footage.clip_count(), 1);
    assert_eq!(footage.groups[0].clips[0].source, "pixabay");
}

#[tokio::test]
async fn nothing_anywhere_means_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let sources: Vec<Box<dyn FootageSource>> = Vec::new();
    let media = FakeMedia::default();
    let settings = FootageSettings::default();
    let render = RenderSettings::default();

    let footage = FootageAcquirer::new(&sources, &media, &settings, &render, dir.path())
        .acquire_flat(&keywords(&["anything"]))
        .await;

    assert!(footage.placeholder);
    assert_eq!(media.placeholders.load(Ordering::SeqCst), 3);
    assert_eq!(footage.clip_count(), 3);
    assert!(footage.clips().all(|c| c.source == PLACEHOLDER_SOURCE && c.duration == 30.0));
    assert!(dir.path().join("placeholder_1.mp4").exists());
}
