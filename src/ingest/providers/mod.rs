// src/ingest/providers/mod.rs
pub mod youtube;

use crate::ingest::config::SourceConfig;
use crate::ingest::types::ItemProvider;

/// Build HTTP providers for every configured source we know how to read.
/// Unknown source types are logged and skipped.
pub fn build_providers(sources: &[SourceConfig]) -> Vec<Box<dyn ItemProvider>> {
    let mut out: Vec<Box<dyn ItemProvider>> = Vec::with_capacity(sources.len());
    for s in sources {
        let Some(url) = s.resolve_feed_url() else {
            continue;
        };
        match s.source_type.as_str() {
            youtube::SOURCE_TYPE => out.push(Box::new(
                youtube::YoutubeFeedProvider::from_url(url, s.name.clone())
                    .with_category(s.category.clone())
                    .with_limit(s.limit),
            )),
            other => {
                tracing::warn!(source_type = other, name = %s.name, "unsupported source type");
            }
        }
    }
    out
}
