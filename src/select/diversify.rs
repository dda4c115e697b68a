// src/select/diversify.rs
//! Diversification: turn a ranked pool into highlights + per-category buckets.
//!
//! Two phases over the ranked pool:
//! 1. **Highlights**: categories are shuffled with the caller's RNG, the ones
//!    present in the pool are capped at `highlight_max`, and each contributes
//!    its best-ranked item from a channel not used yet.
//! 2. **Buckets**: every recognized category (same shuffled order), then
//!    `uncategorized`, takes up to `bucket_max` more items, best rank first.
//!
//! A channel contributes at most one item per run, across both phases.
//! The consumed sets live in this call only.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::payload::{assemble, DigestPayload};
use crate::item::{Item, ItemId, UNCATEGORIZED};

/// Identities and channels already placed in this run.
#[derive(Debug, Default)]
struct Consumed {
    ids: HashSet<ItemId>,
    channels: HashSet<String>,
}

impl Consumed {
    fn is_free(&self, it: &Item) -> bool {
        !self.ids.contains(&it.id) && !self.channels.contains(&it.channel)
    }

    fn take(&mut self, it: &Item) {
        self.ids.insert(it.id.clone());
        self.channels.insert(it.channel.clone());
    }
}

/// Build the digest payload from a pool already sorted by [`super::rank::rank`].
///
/// `categories` is the recognized set in configured order; it drives bucket
/// order in the output. Only the processing order is shuffled.
pub fn diversify<R: Rng + ?Sized>(
    ranked: &[Item],
    categories: &[String],
    highlight_max: usize,
    bucket_max: usize,
    rng: &mut R,
) -> DigestPayload {
    if ranked.is_empty() {
        return DigestPayload::default();
    }

    let mut seen = HashSet::new();
    let mut order: Vec<&str> = categories
        .iter()
        .map(String::as_str)
        .filter(|c| *c != UNCATEGORIZED && seen.insert(*c))
        .collect();
    order.shuffle(rng);

    // Bucket key per pool position, computed once.
    let keys: Vec<&str> = ranked.iter().map(|it| it.bucket_key(categories)).collect();

    let mut consumed = Consumed::default();
    let highlights = pick_highlights(ranked, &keys, &order, highlight_max, &mut consumed);
    let buckets = fill_buckets(ranked, &keys, &order, bucket_max, &mut consumed);

    assemble(highlights, buckets, categories)
}

fn pick_highlights(
    ranked: &[Item],
    keys: &[&str],
    order: &[&str],
    highlight_max: usize,
    consumed: &mut Consumed,
) -> Vec<Item> {
    let candidates: Vec<&str> = order
        .iter()
        .copied()
        .filter(|cat| keys.contains(cat))
        .take(highlight_max)
        .collect();

    let mut out = Vec::with_capacity(candidates.len());
    for cat in candidates {
        if out.len() >= highlight_max {
            break;
        }
        let pick = ranked
            .iter()
            .zip(keys)
            .find(|(it, key)| **key == cat && consumed.is_free(it))
            .map(|(it, _)| it);

        match pick {
            Some(it) => {
                consumed.take(it);
                out.push(it.clone());
            }
            None => debug!(category = cat, "no unused channel left for highlight"),
        }
    }
    out
}

fn fill_buckets(
    ranked: &[Item],
    keys: &[&str],
    order: &[&str],
    bucket_max: usize,
    consumed: &mut Consumed,
) -> HashMap<String, Vec<Item>> {
    let mut out = HashMap::new();
    if bucket_max == 0 {
        return out;
    }

    for cat in order.iter().copied().chain(std::iter::once(UNCATEGORIZED)) {
        let mut bucket = Vec::new();
        for (it, key) in ranked.iter().zip(keys) {
            if bucket.len() >= bucket_max {
                break;
            }
            if *key != cat || !consumed.is_free(it) {
                continue;
            }
            consumed.take(it);
            bucket.push(it.clone());
        }
        if !bucket.is_empty() {
            out.insert(cat.to_string(), bucket);
        }
    }
    out
}
