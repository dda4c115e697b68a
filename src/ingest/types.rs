// src/ingest/types.rs
use anyhow::Result;
use serde::Serialize;

use crate::item::DiscoveredItem;

/// A channel feed that can list its latest items.
#[async_trait::async_trait]
pub trait ItemProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<DiscoveredItem>>;
    /// Channel name, used in logs and metrics labels.
    fn name(&self) -> &str;
}

/// What one ingest pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub fetched: usize,
    pub provider_errors: usize,
    pub inserted: usize,
    pub updated: usize,
    pub refreshed: usize,
}
