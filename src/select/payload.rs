// src/select/payload.rs
//! Delivery payload shape and the assembler that builds it from the
//! diversifier's per-category working map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::item::{Item, UNCATEGORIZED};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBucket {
    pub category: String,
    pub items: Vec<Item>,
}

/// What a delivery run hands to sinks: highlights first, then one bucket
/// per category that actually has items.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DigestPayload {
    pub highlights: Vec<Item>,
    pub buckets: Vec<CategoryBucket>,
}

impl DigestPayload {
    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty() && self.buckets.iter().all(|b| b.items.is_empty())
    }

    pub fn bucket(&self, category: &str) -> Option<&[Item]> {
        self.buckets
            .iter()
            .find(|b| b.category == category)
            .map(|b| b.items.as_slice())
    }

    /// Every item in delivery order: highlights, then buckets.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.highlights
            .iter()
            .chain(self.buckets.iter().flat_map(|b| b.items.iter()))
    }

    pub fn item_count(&self) -> usize {
        self.items().count()
    }

    pub fn bucketed_count(&self) -> usize {
        self.buckets.iter().map(|b| b.items.len()).sum()
    }

    /// Short hash over the selected identities and their placement.
    /// Two runs with the same fingerprint delivered the same digest.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        for it in &self.highlights {
            hasher.update(b"h:");
            hasher.update(it.id.doc_key().as_bytes());
            hasher.update(b"\n");
        }
        for b in &self.buckets {
            hasher.update(b"b:");
            hasher.update(b.category.as_bytes());
            hasher.update(b"\n");
            for it in &b.items {
                hasher.update(it.id.doc_key().as_bytes());
                hasher.update(b"\n");
            }
        }
        let digest = hasher.finalize();
        let mut out = String::with_capacity(12);
        for b in digest.iter().take(6) {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}

/// Merge highlights and the per-category map into a payload.
///
/// Buckets follow `categories` order, then `uncategorized`. Empty buckets are
/// dropped. Keys outside that set are appended in name order so nothing the
/// diversifier selected is lost.
pub fn assemble(
    highlights: Vec<Item>,
    mut buckets: HashMap<String, Vec<Item>>,
    categories: &[String],
) -> DigestPayload {
    let mut out = Vec::with_capacity(buckets.len());

    for cat in categories
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(UNCATEGORIZED))
    {
        if let Some(items) = buckets.remove(cat) {
            if !items.is_empty() {
                out.push(CategoryBucket {
                    category: cat.to_string(),
                    items,
                });
            }
        }
    }

    let mut rest: Vec<_> = buckets
        .into_iter()
        .filter(|(_, items)| !items.is_empty())
        .collect();
    rest.sort_by(|a, b| a.0.cmp(&b.0));
    out.extend(
        rest.into_iter()
            .map(|(category, items)| CategoryBucket { category, items }),
    );

    DigestPayload {
        highlights,
        buckets: out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemId;
    use chrono::Utc;

    fn it(id: &str) -> Item {
        Item {
            id: ItemId::new("youtube", id),
            channel: id.into(),
            category: None,
            popularity: None,
            ingested_at: Utc::now(),
            title: id.into(),
            url: String::new(),
            thumbnail: None,
            description: String::new(),
            published_at: None,
        }
    }

    #[test]
    fn buckets_follow_configured_order_with_uncategorized_last() {
        let cats = vec!["tech".to_string(), "economy".to_string()];
        let mut map = HashMap::new();
        map.insert(UNCATEGORIZED.to_string(), vec![it("u")]);
        map.insert("economy".to_string(), vec![it("e")]);
        map.insert("tech".to_string(), vec![]);

        let p = assemble(vec![it("h")], map, &cats);
        let names: Vec<_> = p.buckets.iter().map(|b| b.category.as_str()).collect();
        assert_eq!(names, vec!["economy", UNCATEGORIZED]);
        assert_eq!(p.item_count(), 3);
        assert_eq!(p.bucketed_count(), 2);
        assert!(p.bucket("tech").is_none());
    }

    #[test]
    fn empty_payload_is_empty() {
        let p = assemble(Vec::new(), HashMap::new(), &[]);
        assert!(p.is_empty());
        assert_eq!(p, DigestPayload::default());
    }

    #[test]
    fn fingerprint_tracks_placement() {
        let cats = vec!["economy".to_string()];
        let mut a = HashMap::new();
        a.insert("economy".to_string(), vec![it("x")]);
        let in_bucket = assemble(vec![it("y")], a, &cats);
        let mut b = HashMap::new();
        b.insert("economy".to_string(), vec![it("y")]);
        let swapped = assemble(vec![it("x")], b, &cats);
        assert_eq!(in_bucket.fingerprint().len(), 12);
        assert_ne!(in_bucket.fingerprint(), swapped.fingerprint());
    }
}
