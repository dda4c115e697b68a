// src/ingest/providers/youtube.rs
//! YouTube channel feed provider (public Atom feed, no API key).
//!
//! The feed carries id, title, link, publish time, thumbnail, description and
//! the view count under `media:community/media:statistics`. A missing or
//! unparsable view count stays `None`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::ingest::types::ItemProvider;
use crate::ingest::{normalize_title, truncate_description};
use crate::item::{DiscoveredItem, ItemId};

pub const SOURCE_TYPE: &str = "youtube";

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    /// `yt:video:<id>`; fallback when `yt:videoId` is absent.
    id: Option<String>,
    #[serde(rename = "videoId")]
    video_id: Option<String>,
    title: Option<String>,
    link: Option<Link>,
    published: Option<String>,
    #[serde(rename = "group")]
    media: Option<MediaGroup>,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href")]
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaGroup {
    #[serde(rename = "thumbnail")]
    thumbnail: Option<Thumbnail>,
    #[serde(rename = "description")]
    description: Option<String>,
    #[serde(rename = "community")]
    community: Option<Community>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    #[serde(rename = "@url")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Community {
    #[serde(rename = "statistics")]
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
struct Statistics {
    #[serde(rename = "@views")]
    views: Option<String>,
}

fn parse_rfc3339(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts.trim(), &Rfc3339)
        .ok()
        .and_then(|dt| DateTime::from_timestamp(dt.unix_timestamp(), 0))
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

pub struct YoutubeFeedProvider {
    channel: String,
    category: Option<String>,
    limit: usize,
    mode: Mode,
}

impl YoutubeFeedProvider {
    /// Parse a feed document held in memory (tests, replays).
    pub fn from_fixture(xml: &str, channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            category: None,
            limit: usize::MAX,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            category: None,
            limit: usize::MAX,
            mode: Mode::Http {
                url: url.into(),
                client: reqwest::Client::new(),
            },
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn parse_items_from_str(&self, s: &str) -> Result<Vec<DiscoveredItem>> {
        let t0 = std::time::Instant::now();
        let feed: Feed = from_str(s).context("parsing youtube feed xml")?;

        let mut out = Vec::with_capacity(feed.entries.len().min(self.limit));
        for e in feed.entries {
            if out.len() >= self.limit {
                break;
            }
            let video_id = e
                .video_id
                .or_else(|| {
                    e.id.as_deref()
                        .and_then(|id| id.strip_prefix("yt:video:"))
                        .map(str::to_string)
                })
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
            let Some(video_id) = video_id else {
                continue;
            };

            let media = e.media;
            let thumbnail = media
                .as_ref()
                .and_then(|m| m.thumbnail.as_ref())
                .and_then(|t| t.url.clone())
                .unwrap_or_else(|| format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg"));
            let popularity = media
                .as_ref()
                .and_then(|m| m.community.as_ref())
                .and_then(|c| c.statistics.as_ref())
                .and_then(|s| s.views.as_deref())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let description = truncate_description(
                media
                    .as_ref()
                    .and_then(|m| m.description.as_deref())
                    .unwrap_or_default(),
            );

            let title = normalize_title(e.title.as_deref().unwrap_or_default());
            out.push(DiscoveredItem {
                url: e
                    .link
                    .and_then(|l| l.href)
                    .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={video_id}")),
                id: ItemId::new(SOURCE_TYPE, video_id),
                channel: self.channel.clone(),
                category: self.category.clone(),
                popularity,
                title: if title.is_empty() {
                    "Unknown Title".to_string()
                } else {
                    title
                },
                thumbnail: Some(thumbnail),
                description,
                published_at: e.published.as_deref().and_then(parse_rfc3339),
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        counter!("ingest_items_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl ItemProvider for YoutubeFeedProvider {
    async fn fetch_latest(&self) -> Result<Vec<DiscoveredItem>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items_from_str(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("youtube feed get {url}"))?
                    .error_for_status()
                    .context("youtube feed non-2xx")?
                    .text()
                    .await
                    .context("youtube feed .text()")?;
                self.parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.channel
    }
}
