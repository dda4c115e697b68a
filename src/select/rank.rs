// src/select/rank.rs
//! Ranking by popularity.
//!
//! - Known popularity (including `0`) always ranks above unknown.
//! - Among known values: descending.
//! - Ties, including two unknowns, keep their input order (`sort_by` is stable).

use std::cmp::Ordering;

use crate::item::Item;

/// Compare two popularity values, "better" first. `None` sorts as −∞.
pub fn popularity_order(a: Option<u64>, b: Option<u64>) -> Ordering {
    // Option<u64> orders None < Some(_), so reversing puts None last.
    b.cmp(&a)
}

/// Sort `items` by popularity, descending, unknowns last.
pub fn rank(mut items: Vec<Item>) -> Vec<Item> {
    items.sort_by(|a, b| popularity_order(a.popularity, b.popularity));
    items
}

/// True if `items` respects the ranking order. Used by tests and debug asserts.
pub fn is_ranked(items: &[Item]) -> bool {
    items
        .windows(2)
        .all(|w| popularity_order(w[0].popularity, w[1].popularity) != Ordering::Greater)
}
