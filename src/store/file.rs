// src/store/file.rs
//! JSON-file persistence on top of [`MemoryItemStore`].
//!
//! The whole store is rewritten for each upsert call (a batch counts as
//! one). Changes are applied to a copy, written to a sibling temp file,
//! renamed into place, and only then made visible in memory. A failed write
//! leaves both the file and the in-memory view as they were.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::{fs, sync::Mutex};

use super::memory::sorted_items;
use super::{ItemStore, MemoryItemStore, RefreshPolicy, UpsertCounts, UpsertOutcome};
use crate::item::{DiscoveredItem, Item, ItemId};

pub const ENV_STORE_PATH: &str = "DIGEST_STORE_PATH";
pub const DEFAULT_STORE_PATH: &str = "state/items.json";

pub struct FileItemStore {
    inner: MemoryItemStore,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileItemStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>, policy: RefreshPolicy) -> Result<Self> {
        let path = path.into();
        let items: Vec<Item> = match fs::read_to_string(&path).await {
            Ok(s) if s.trim().is_empty() => Vec::new(),
            Ok(s) => serde_json::from_str(&s)
                .with_context(|| format!("parsing item store {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading item store {}", path.display()))
            }
        };
        tracing::info!(path = %path.display(), items = items.len(), "item store opened");
        Ok(Self {
            inner: MemoryItemStore::with_items(policy, items),
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// `$DIGEST_STORE_PATH` or `state/items.json`.
    pub async fn open_default(policy: RefreshPolicy) -> Result<Self> {
        let path = std::env::var(ENV_STORE_PATH).unwrap_or_else(|_| DEFAULT_STORE_PATH.into());
        Self::open(path, policy).await
    }

    /// Serialized per store: stage, write, then commit.
    async fn apply(
        &self,
        items: Vec<DiscoveredItem>,
        seen_at: DateTime<Utc>,
    ) -> Result<Vec<UpsertOutcome>> {
        let _guard = self.write_lock.lock().await;
        let (staged, outcomes) = self.inner.stage(items, seen_at)?;
        self.write_file(&staged).await?;
        self.inner.commit(staged)?;
        Ok(outcomes)
    }

    async fn write_file(&self, map: &HashMap<ItemId, Item>) -> Result<()> {
        let bytes =
            serde_json::to_vec_pretty(&sorted_items(map)).context("serializing item store")?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating store dir {}", dir.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ItemStore for FileItemStore {
    async fn fetch_items_since(&self, since: DateTime<Utc>) -> Result<Vec<Item>> {
        self.inner.fetch_items_since(since).await
    }

    async fn upsert(&self, item: DiscoveredItem, seen_at: DateTime<Utc>) -> Result<UpsertOutcome> {
        self.apply(vec![item], seen_at)
            .await?
            .pop()
            .ok_or_else(|| anyhow!("upsert produced no outcome"))
    }

    async fn upsert_batch(
        &self,
        items: Vec<DiscoveredItem>,
        seen_at: DateTime<Utc>,
    ) -> Result<UpsertCounts> {
        let mut counts = UpsertCounts::default();
        for outcome in self.apply(items, seen_at).await? {
            counts.record(outcome);
        }
        Ok(counts)
    }

    async fn len(&self) -> Result<usize> {
        self.inner.len().await
    }
}
