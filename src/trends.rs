//! Topic suggestions from Google Trends with per-niche fallbacks.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use tracing::{info, warn};

const TRENDS_RSS: &str = "https://trends.google.com/trending/rss";

static ITEM_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<item>.*?<title>(?:<!\[CDATA\[)?(.*?)(?:\]\]>)?</title>").unwrap());

const ANIMALS: &[&str] = &[
    "5 Amazing Facts About Dolphins",
    "The Most Dangerous Animals in the World",
    "Cute Baby Animals That Will Melt Your Heart",
    "Animals With Superpowers",
    "The Smartest Animals on Earth",
];
const SPACE: &[&str] = &[
    "5 Mind-Blowing Facts About Black Holes",
    "What Would Happen If You Fell Into a Black Hole",
    "The Biggest Stars in the Universe",
    "Mysterious Planets Scientists Can't Explain",
    "Amazing Facts About Mars",
];
const GAMING: &[&str] = &[
    "5 Minecraft Tips Pro Players Use",
    "Hidden Secrets in Popular Video Games",
    "The Most Expensive Video Games Ever Made",
    "Gaming World Records That Seem Impossible",
    "Easter Eggs You Missed in Your Favorite Games",
];
const SCIENCE: &[&str] = &[
    "5 Science Experiments That Went Wrong",
    "Mind-Blowing Science Facts",
    "Inventions That Changed the World",
    "The Weirdest Scientific Discoveries",
    "Science Facts That Sound Fake But Are True",
];
const AMAZING_FACTS: &[&str] = &[
    "5 Facts That Will Blow Your Mind",
    "Things You Didn't Know About Everyday Objects",
    "The Most Unbelievable World Records",
    "Facts That Sound Fake But Are 100% True",
    "Mind-Blowing Facts About the Human Body",
];

const ANIMAL_WORDS: &[&str] = &["animal", "dog", "cat", "wildlife", "shark", "bird", "zoo"];
const SPACE_WORDS: &[&str] = &["space", "nasa", "planet", "moon", "mars", "star", "rocket"];
const GAMING_WORDS: &[&str] = &["game", "gaming", "minecraft", "xbox", "playstation", "nintendo"];
const SCIENCE_WORDS: &[&str] = &["science", "research", "study", "discovery", "scientist"];
const FACT_WORDS: &[&str] = &["facts", "amazing", "interesting", "record", "did you know"];

/// Fallback topics and relevance keywords for a niche.
fn niche_table(niche: &str) -> (&'static [&'static str], &'static [&'static str]) {
    let niche = niche.to_lowercase();
    if niche.contains("animal") {
        (ANIMALS, ANIMAL_WORDS)
    } else if niche.contains("space") {
        (SPACE, SPACE_WORDS)
    } else if niche.contains("gaming") || niche.contains("game") {
        (GAMING, GAMING_WORDS)
    } else if niche.contains("science") {
        (SCIENCE, SCIENCE_WORDS)
    } else {
        (AMAZING_FACTS, FACT_WORDS)
    }
}

/// Static topics used when the live feed is unavailable.
pub fn fallback_topics(niche: &str) -> Vec<String> {
    niche_table(niche).0.iter().map(|s| s.to_string()).collect()
}

fn unescape(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

pub fn parse_feed_titles(xml: &str) -> Vec<String> {
    ITEM_TITLE
        .captures_iter(xml)
        .map(|cap| unescape(cap[1].trim()))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Niche matches first, then the rest of the feed in order.
pub fn rank_for_niche(titles: Vec<String>, niche: &str, count: usize) -> Vec<String> {
    let keywords = niche_table(niche).1;
    let (mut matching, rest): (Vec<String>, Vec<String>) = titles.into_iter().partition(|t| {
        let lower = t.to_lowercase();
        keywords.iter().any(|k| lower.contains(*k))
    });
    matching.extend(rest);
    matching.truncate(count);
    matching
}

pub struct TrendFinder {
    client: Client,
    feed_url: String,
}

impl TrendFinder {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            feed_url: TRENDS_RSS.to_string(),
        }
    }

    pub fn with_feed_url(mut self, url: impl Into<String>) -> Self {
        self.feed_url = url.into();
        self
    }

    async fn fetch_titles(&self, region: &str) -> anyhow::Result<Vec<String>> {
        let body = self
            .client
            .get(&self.feed_url)
            .query(&[("geo", region)])
            .header(USER_AGENT, "faceless-trends/0.1")
            .timeout(Duration::from_secs(15))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(parse_feed_titles(&body))
    }

    /// Never fails: any error yields the niche's static list.
    pub async fn suggest(&self, niche: &str, region: &str, count: usize) -> Vec<String> {
        info!("Fetching trending searches for region {}", region);
        match self.fetch_titles(region).await {
            Ok(titles) if !titles.is_empty() => {
                info!("Found {} trending topics", titles.len());
                rank_for_niche(titles, niche, count)
            }
            Ok(_) => {
                warn!("Trend feed was empty; using fallback topics for '{}'", niche);
                fallback_topics(niche).into_iter().take(count).collect()
            }
            Err(e) => {
                warn!("Could not fetch trends ({:#}); using fallback topics for '{}'", e, niche);
                fallback_topics(niche).into_iter().take(count).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss><channel><title>Daily Search Trends</title>
<item><title>Lakers vs Celtics</title><ht:approx_traffic>200K+</ht:approx_traffic></item>
<item><title><![CDATA[NASA Artemis launch]]></title></item>
<item><title>Tom &amp; Jerry reboot</title></item>
</channel></rss>"#;

    #[test]
    fn feed_titles_skip_channel_title() {
        assert_eq!(
            parse_feed_titles(FEED),
            vec!["Lakers vs Celtics", "NASA Artemis launch", "Tom & Jerry reboot"]
        );
    }

    #[test]
    fn niche_matches_come_first() {
        let ranked = rank_for_niche(parse_feed_titles(FEED), "space", 2);
        assert_eq!(ranked, vec!["NASA Artemis launch", "Lakers vs Celtics"]);
    }

    #[test]
    fn unknown_niche_uses_amazing_facts() {
        assert_eq!(fallback_topics("cooking")[0], "5 Facts That Will Blow Your Mind");
        assert_eq!(fallback_topics("Gaming Channel")[0], "5 Minecraft Tips Pro Players Use");
    }

    #[tokio::test]
    async fn unreachable_feed_falls_back() {
        let finder = TrendFinder::new(Client::new()).with_feed_url("http://127.0.0.1:9/rss");
        let topics = finder.suggest("animals", "US", 3).await;
        assert_eq!(topics.len(), 3);
        assert_eq!(topics[0], "5 Amazing Facts About Dolphins");
    }
}
