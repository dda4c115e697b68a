// src/select/mod.rs
//! Selection pipeline: freshness → rank → diversify → assemble.
//!
//! Pure and synchronous. Operates on one snapshot handed in by the caller;
//! no I/O, no shared state, so concurrent runs cannot interfere.

pub mod diversify;
pub mod freshness;
pub mod payload;
pub mod rank;

pub use diversify::diversify;
pub use freshness::{filter_fresh, window_start};
pub use payload::{assemble, CategoryBucket, DigestPayload};
pub use rank::rank;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::config::DigestConfig;
use crate::item::Item;

/// Result of one selection pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Nothing inside the freshness window. Expected state, not a failure.
    NoContent,
    Ready {
        /// Size of the fresh pool the payload was drawn from.
        pool: usize,
        payload: DigestPayload,
    },
}

/// Run the full selection over `snapshot` as of `now`.
pub fn select<R: Rng + ?Sized>(
    snapshot: Vec<Item>,
    now: DateTime<Utc>,
    cfg: &DigestConfig,
    rng: &mut R,
) -> Selection {
    let fresh = filter_fresh(snapshot, now, cfg.freshness_window());
    if fresh.is_empty() {
        return Selection::NoContent;
    }

    let ranked = rank(fresh);
    debug_assert!(rank::is_ranked(&ranked));

    let payload = diversify(
        &ranked,
        &cfg.recognized_categories,
        cfg.highlight_max,
        cfg.bucket_max_per_category,
        rng,
    );
    Selection::Ready {
        pool: ranked.len(),
        payload,
    }
}
