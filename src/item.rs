//! # Items
//! The content unit flowing through ingestion, storage and selection.
//!
//! `popularity` and `category` are optional on purpose: an unknown view count
//! is not a zero view count, and a missing category is routed to the
//! `uncategorized` bucket instead of being guessed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bucket name for items without a recognized category.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Stable identity of an item: `(source_type, original_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId {
    pub source_type: String, // e.g. "youtube"
    pub original_id: String, // platform-native id, e.g. a video id
}

impl ItemId {
    pub fn new(source_type: impl Into<String>, original_id: impl Into<String>) -> Self {
        Self {
            source_type: source_type.into(),
            original_id: original_id.into(),
        }
    }

    /// Document key used by stores: `youtube_abc123`.
    pub fn doc_key(&self) -> String {
        format!("{}_{}", self.source_type, self.original_id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_type, self.original_id)
    }
}

/// An item as produced by a provider, before the store stamps `ingested_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredItem {
    pub id: ItemId,
    pub channel: String,
    pub category: Option<String>,
    pub popularity: Option<u64>,
    pub title: String,
    pub url: String,
    pub thumbnail: Option<String>,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl DiscoveredItem {
    /// Turn a discovery into a stored item first seen at `seen_at`.
    pub fn into_item(self, seen_at: DateTime<Utc>) -> Item {
        Item {
            id: self.id,
            channel: self.channel,
            category: self.category,
            popularity: self.popularity,
            ingested_at: seen_at,
            title: self.title,
            url: self.url,
            thumbnail: self.thumbnail,
            description: self.description,
            published_at: self.published_at,
        }
    }
}

/// A stored item. Read-only for the selection pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub channel: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub popularity: Option<u64>,
    pub ingested_at: DateTime<Utc>,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Bucket this item belongs to given the recognized category set.
    /// Missing or unrecognized categories fall back to [`UNCATEGORIZED`].
    pub fn bucket_key<'a>(&'a self, recognized: &[String]) -> &'a str {
        match self.category.as_deref() {
            Some(c) if recognized.iter().any(|r| r == c) => c,
            _ => UNCATEGORIZED,
        }
    }
}
