// src/store/mod.rs
//! Item store interface and the merge rules shared by implementations.
//!
//! Identity is `(source_type, original_id)`. Re-ingesting an identity merges
//! into the stored item and never creates a second one.

pub mod file;
pub mod memory;

pub use file::FileItemStore;
pub use memory::MemoryItemStore;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::{DiscoveredItem, Item};

/// When a re-discovered item gets a new `ingested_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// `ingested_at` is the first-discovery time, always.
    #[default]
    Preserve,
    /// A category correction makes the item fresh again.
    OnCategoryChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// Updated and `ingested_at` moved to the new sighting.
    Refreshed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertCounts {
    pub inserted: usize,
    pub updated: usize,
    pub refreshed: usize,
}

impl UpsertCounts {
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Refreshed => self.refreshed += 1,
        }
    }
}

#[async_trait::async_trait]
pub trait ItemStore: Send + Sync {
    /// All items with `ingested_at >= since`. Order is store-defined.
    async fn fetch_items_since(&self, since: DateTime<Utc>) -> Result<Vec<Item>>;

    /// Insert or merge one discovery seen at `seen_at`.
    async fn upsert(&self, item: DiscoveredItem, seen_at: DateTime<Utc>) -> Result<UpsertOutcome>;

    async fn upsert_batch(
        &self,
        items: Vec<DiscoveredItem>,
        seen_at: DateTime<Utc>,
    ) -> Result<UpsertCounts> {
        let mut counts = UpsertCounts::default();
        for it in items {
            counts.record(self.upsert(it, seen_at).await?);
        }
        Ok(counts)
    }

    async fn len(&self) -> Result<usize>;
}

/// Merge a re-discovery into the stored item.
///
/// - Display fields take the new values; optional ones only when present.
/// - `popularity` is replaced only by a known value.
/// - `category`: the later one wins when present.
/// - `ingested_at` stays unless `policy` says the change refreshes it.
pub fn merge(
    existing: &mut Item,
    incoming: DiscoveredItem,
    seen_at: DateTime<Utc>,
    policy: RefreshPolicy,
) -> UpsertOutcome {
    let category_changed =
        incoming.category.is_some() && incoming.category != existing.category;

    existing.channel = incoming.channel;
    existing.title = incoming.title;
    existing.url = incoming.url;
    existing.description = incoming.description;
    if incoming.thumbnail.is_some() {
        existing.thumbnail = incoming.thumbnail;
    }
    if incoming.published_at.is_some() {
        existing.published_at = incoming.published_at;
    }
    if incoming.popularity.is_some() {
        existing.popularity = incoming.popularity;
    }
    if incoming.category.is_some() {
        existing.category = incoming.category;
    }

    match policy {
        RefreshPolicy::OnCategoryChange if category_changed => {
            existing.ingested_at = seen_at;
            UpsertOutcome::Refreshed
        }
        _ => UpsertOutcome::Updated,
    }
}
