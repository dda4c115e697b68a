// src/store/memory.rs
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use super::{merge, ItemStore, RefreshPolicy, UpsertOutcome};
use crate::item::{DiscoveredItem, Item, ItemId};

/// Thread-safe in-memory store keyed by item identity.
#[derive(Debug, Default)]
pub struct MemoryItemStore {
    inner: RwLock<HashMap<ItemId, Item>>,
    policy: RefreshPolicy,
}

impl MemoryItemStore {
    pub fn new(policy: RefreshPolicy) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            policy,
        }
    }

    /// Seed with already-stored items (later duplicates replace earlier ones).
    pub fn with_items(policy: RefreshPolicy, items: Vec<Item>) -> Self {
        let map = items.into_iter().map(|it| (it.id.clone(), it)).collect();
        Self {
            inner: RwLock::new(map),
            policy,
        }
    }

    fn upsert_sync(&self, item: DiscoveredItem, seen_at: DateTime<Utc>) -> Result<UpsertOutcome> {
        let mut g = self
            .inner
            .write()
            .map_err(|_| anyhow!("item store lock poisoned"))?;
        Ok(apply_upsert(&mut g, item, seen_at, self.policy))
    }

    /// Apply `items` to a copy of the map. The store itself is untouched
    /// until the copy is handed to [`commit`](Self::commit).
    pub(crate) fn stage(
        &self,
        items: Vec<DiscoveredItem>,
        seen_at: DateTime<Utc>,
    ) -> Result<(HashMap<ItemId, Item>, Vec<UpsertOutcome>)> {
        let mut staged = self
            .inner
            .read()
            .map_err(|_| anyhow!("item store lock poisoned"))?
            .clone();
        let outcomes = items
            .into_iter()
            .map(|it| apply_upsert(&mut staged, it, seen_at, self.policy))
            .collect();
        Ok((staged, outcomes))
    }

    pub(crate) fn commit(&self, staged: HashMap<ItemId, Item>) -> Result<()> {
        let mut g = self
            .inner
            .write()
            .map_err(|_| anyhow!("item store lock poisoned"))?;
        *g = staged;
        Ok(())
    }
}

fn apply_upsert(
    map: &mut HashMap<ItemId, Item>,
    item: DiscoveredItem,
    seen_at: DateTime<Utc>,
    policy: RefreshPolicy,
) -> UpsertOutcome {
    match map.get_mut(&item.id) {
        Some(existing) => merge(existing, item, seen_at, policy),
        None => {
            map.insert(item.id.clone(), item.into_item(seen_at));
            UpsertOutcome::Inserted
        }
    }
}

/// Newest first, ties by document key.
pub(crate) fn sorted_items(map: &HashMap<ItemId, Item>) -> Vec<Item> {
    let mut v: Vec<Item> = map.values().cloned().collect();
    sort_newest_first(&mut v);
    v
}

fn sort_newest_first(v: &mut [Item]) {
    v.sort_by(|a, b| {
        b.ingested_at
            .cmp(&a.ingested_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[async_trait::async_trait]
impl ItemStore for MemoryItemStore {
    async fn fetch_items_since(&self, since: DateTime<Utc>) -> Result<Vec<Item>> {
        let g = self
            .inner
            .read()
            .map_err(|_| anyhow!("item store lock poisoned"))?;
        let mut v: Vec<Item> = g
            .values()
            .filter(|it| it.ingested_at >= since)
            .cloned()
            .collect();
        drop(g);
        sort_newest_first(&mut v);
        Ok(v)
    }

    async fn upsert(&self, item: DiscoveredItem, seen_at: DateTime<Utc>) -> Result<UpsertOutcome> {
        self.upsert_sync(item, seen_at)
    }

    async fn len(&self) -> Result<usize> {
        let g = self
            .inner
            .read()
            .map_err(|_| anyhow!("item store lock poisoned"))?;
        Ok(g.len())
    }
}
