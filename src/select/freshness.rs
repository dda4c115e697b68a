// src/select/freshness.rs
use chrono::{DateTime, Duration, Utc};

use crate::item::Item;

/// `now - window`, saturating at the earliest representable instant.
pub fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Keep items with `ingested_at >= now - window`. The bound is inclusive.
///
/// Order is whatever the input had; the ranker re-sorts.
pub fn filter_fresh(items: Vec<Item>, now: DateTime<Utc>, window: Duration) -> Vec<Item> {
    let cutoff = window_start(now, window);
    items
        .into_iter()
        .filter(|it| it.ingested_at >= cutoff)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemId;
    use chrono::TimeZone;

    fn at(id: &str, ts: DateTime<Utc>) -> Item {
        Item {
            id: ItemId::new("youtube", id),
            channel: "c".into(),
            category: None,
            popularity: None,
            ingested_at: ts,
            title: id.into(),
            url: String::new(),
            thumbnail: None,
            description: String::new(),
            published_at: None,
        }
    }

    #[test]
    fn keeps_boundary_and_drops_older() {
        let now = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();
        let window = Duration::hours(26);
        let items = vec![
            at("edge", now - window),
            at("old", now - window - Duration::seconds(1)),
            at("new", now - Duration::minutes(5)),
        ];
        let kept = filter_fresh(items, now, window);
        let ids: Vec<_> = kept.iter().map(|i| i.id.original_id.as_str()).collect();
        assert_eq!(ids, vec!["edge", "new"]);
    }

    #[test]
    fn empty_in_empty_out() {
        let now = Utc::now();
        assert!(filter_fresh(Vec::new(), now, Duration::hours(24)).is_empty());
    }

    #[test]
    fn window_start_saturates_instead_of_panicking() {
        let now = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();
        assert_eq!(
            window_start(now, Duration::days(100_000_000_000)),
            DateTime::<Utc>::MIN_UTC
        );
        assert_eq!(
            window_start(now, Duration::hours(1)),
            now - Duration::hours(1)
        );
    }
}
