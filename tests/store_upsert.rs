// tests/store_upsert.rs
use chrono::{Duration, TimeZone, Utc};
use video_digest::store::{
    file::FileItemStore, memory::MemoryItemStore, ItemStore, RefreshPolicy, UpsertOutcome,
};
use video_digest::{DiscoveredItem, ItemId};

fn abc123(category: Option<&str>) -> DiscoveredItem {
    DiscoveredItem {
        id: ItemId::new("youtube", "abc123"),
        channel: "c1".into(),
        category: category.map(str::to_string),
        popularity: Some(10),
        title: "Same video".into(),
        url: "https://www.youtube.com/watch?v=abc123".into(),
        thumbnail: None,
        description: "d".into(),
        published_at: None,
    }
}

#[tokio::test]
async fn same_identity_is_stored_once_and_keeps_first_ingest_time() {
    let store = MemoryItemStore::new(RefreshPolicy::Preserve);
    let t0 = Utc.with_ymd_and_hms(2025, 9, 5, 0, 0, 0).unwrap();
    let t1 = t0 + Duration::hours(5);

    let first = store.upsert(abc123(Some("economy")), t0).await.unwrap();
    let second = store.upsert(abc123(Some("politics")), t1).await.unwrap();
    assert_eq!(first, UpsertOutcome::Inserted);
    assert_eq!(second, UpsertOutcome::Updated);

    assert_eq!(store.len().await.unwrap(), 1);
    let all = store.fetch_items_since(t0 - Duration::days(1)).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].ingested_at, t0);
    assert_eq!(all[0].category.as_deref(), Some("politics"));
}

#[tokio::test]
async fn opt_in_policy_refreshes_on_category_change() {
    let store = MemoryItemStore::new(RefreshPolicy::OnCategoryChange);
    let t0 = Utc.with_ymd_and_hms(2025, 9, 5, 0, 0, 0).unwrap();
    let t1 = t0 + Duration::hours(30);

    store.upsert(abc123(Some("economy")), t0).await.unwrap();
    let out = store.upsert(abc123(Some("politics")), t1).await.unwrap();
    assert_eq!(out, UpsertOutcome::Refreshed);

    // Now fresh again relative to t1.
    let fresh = store.fetch_items_since(t1 - Duration::hours(1)).await.unwrap();
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].ingested_at, t1);
}

#[tokio::test]
async fn duplicates_inside_one_batch_collapse() {
    let store = MemoryItemStore::new(RefreshPolicy::Preserve);
    let now = Utc::now();
    let counts = store
        .upsert_batch(vec![abc123(None), abc123(Some("tech"))], now)
        .await
        .unwrap();
    assert_eq!(counts.inserted, 1);
    assert_eq!(counts.updated, 1);
    assert_eq!(store.len().await.unwrap(), 1);
}

#[tokio::test]
async fn file_store_persists_merged_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("items.json");
    let t0 = Utc.with_ymd_and_hms(2025, 9, 5, 0, 0, 0).unwrap();

    {
        let store = FileItemStore::open(&path, RefreshPolicy::Preserve).await.unwrap();
        store.upsert(abc123(Some("economy")), t0).await.unwrap();
        store
            .upsert(abc123(Some("politics")), t0 + Duration::hours(2))
            .await
            .unwrap();
    }

    let reopened = FileItemStore::open(&path, RefreshPolicy::Preserve).await.unwrap();
    let items = reopened
        .fetch_items_since(t0 - Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].ingested_at, t0);
    assert_eq!(items[0].category.as_deref(), Some("politics"));
}
