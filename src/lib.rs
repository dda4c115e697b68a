// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod delivery;
pub mod digest;
pub mod history;
pub mod ingest;
pub mod item;
pub mod metrics;
pub mod scheduler;
pub mod select;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::DigestConfig;
pub use crate::digest::{run_digest, RunOutcome};
pub use crate::item::{DiscoveredItem, Item, ItemId};
pub use crate::select::{select, DigestPayload, Selection};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_JSON: &str = "DIGEST_LOG_JSON";

/// Install the global subscriber. `RUST_LOG` wins over the built-in filter;
/// `DIGEST_LOG_JSON=1` switches to JSON lines. Safe to call twice.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("video_digest=info,run_digest=info,warn"));
    let json = std::env::var(ENV_LOG_JSON).ok().is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
