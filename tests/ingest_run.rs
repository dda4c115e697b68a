// tests/ingest_run.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use video_digest::ingest::providers::youtube::YoutubeFeedProvider;
use video_digest::ingest::{self, types::ItemProvider};
use video_digest::store::{memory::MemoryItemStore, ItemStore, RefreshPolicy};
use video_digest::DiscoveredItem;

const FEED: &str = include_str!("fixtures/youtube_feed.xml");

struct BrokenProvider;

#[async_trait]
impl ItemProvider for BrokenProvider {
    async fn fetch_latest(&self) -> Result<Vec<DiscoveredItem>> {
        Err(anyhow!("feed unavailable"))
    }
    fn name(&self) -> &str {
        "broken"
    }
}

#[tokio::test]
async fn provider_failure_does_not_stop_the_pass() {
    let store = MemoryItemStore::new(RefreshPolicy::Preserve);
    let providers: Vec<Box<dyn ItemProvider>> = vec![
        Box::new(BrokenProvider),
        Box::new(
            YoutubeFeedProvider::from_fixture(FEED, "Syuka World")
                .with_category(Some("economy".into())),
        ),
    ];

    let now = Utc::now();
    let report = ingest::run_once(&providers, &store, now).await.unwrap();
    assert_eq!(report.provider_errors, 1);
    assert_eq!(report.fetched, 3);
    assert_eq!(report.inserted, 3);
    assert_eq!(store.len().await.unwrap(), 3);

    let items = store.fetch_items_since(now - Duration::seconds(1)).await.unwrap();
    assert!(items.iter().all(|i| i.ingested_at == now));
}

#[tokio::test]
async fn second_pass_updates_without_refreshing() {
    let store = MemoryItemStore::new(RefreshPolicy::Preserve);
    let providers: Vec<Box<dyn ItemProvider>> =
        vec![Box::new(YoutubeFeedProvider::from_fixture(FEED, "Syuka World"))];

    let t0 = Utc::now() - Duration::hours(30);
    ingest::run_once(&providers, &store, t0).await.unwrap();
    let report = ingest::run_once(&providers, &store, Utc::now()).await.unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(report.updated, 3);
    assert_eq!(report.refreshed, 0);

    // Still stamped with the first sighting, so outside a 26h window.
    let fresh = store
        .fetch_items_since(Utc::now() - Duration::hours(26))
        .await
        .unwrap();
    assert!(fresh.is_empty());
}

#[tokio::test]
async fn no_providers_is_an_empty_report() {
    let store = MemoryItemStore::new(RefreshPolicy::Preserve);
    let report = ingest::run_once(&[], &store, Utc::now()).await.unwrap();
    assert_eq!(report.fetched, 0);
    assert_eq!(report.inserted, 0);
}
