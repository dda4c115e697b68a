// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod types;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::ingest::types::{IngestReport, ItemProvider};
use crate::store::ItemStore;

pub const DESCRIPTION_MAX_CHARS: usize = 200;
pub const EMPTY_DESCRIPTION: &str = "No description available.";
const TITLE_MAX_CHARS: usize = 300;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_runs_total", "Scheduled ingest passes.");
        describe_counter!("ingest_items_total", "Items parsed from channel feeds.");
        describe_counter!("ingest_inserted_total", "Items stored for the first time.");
        describe_counter!(
            "ingest_updated_total",
            "Re-discovered items merged into the store."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when ingest pipeline last ran."
        );
    });
}

/// Normalize display text: decode entities, strip tags, fold quotes and
/// whitespace. Punctuation is left alone; titles need their `?` and `!`.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags =
        RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z][^>]*>").expect("tag regex"));
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("ws regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    out
}

pub fn normalize_title(s: &str) -> String {
    let t = normalize_text(s);
    if t.chars().count() > TITLE_MAX_CHARS {
        t.chars().take(TITLE_MAX_CHARS).collect()
    } else {
        t
    }
}

/// Normalized description cut to 200 chars with a `...` tail.
/// Empty input yields a fixed placeholder.
pub fn truncate_description(s: &str) -> String {
    let t = normalize_text(s);
    if t.is_empty() {
        return EMPTY_DESCRIPTION.to_string();
    }
    if t.chars().count() > DESCRIPTION_MAX_CHARS {
        let mut cut: String = t.chars().take(DESCRIPTION_MAX_CHARS).collect();
        cut.push_str("...");
        cut
    } else {
        t
    }
}

/// Fetch every provider once and upsert the results in one batch.
///
/// Provider failures are logged and counted; the pass continues with the
/// others. A store failure aborts the pass.
pub async fn run_once(
    providers: &[Box<dyn ItemProvider>],
    store: &dyn ItemStore,
    now: DateTime<Utc>,
) -> Result<IngestReport> {
    ensure_metrics_described();

    let mut report = IngestReport::default();
    let mut raw = Vec::new();
    for p in providers {
        match p.fetch_latest().await {
            Ok(mut v) => {
                tracing::debug!(provider = p.name(), items = v.len(), "provider fetched");
                raw.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(error = ?e, provider = p.name(), "provider error");
                counter!("ingest_provider_errors_total").increment(1);
                report.provider_errors += 1;
            }
        }
    }
    report.fetched = raw.len();

    let counts = store
        .upsert_batch(raw, now)
        .await
        .context("storing ingested items")?;
    report.inserted = counts.inserted;
    report.updated = counts.updated;
    report.refreshed = counts.refreshed;

    // Telemetry
    counter!("ingest_inserted_total").increment(counts.inserted as u64);
    counter!("ingest_updated_total").increment((counts.updated + counts.refreshed) as u64);
    gauge!("ingest_pipeline_last_run_ts").set(now.timestamp() as f64);

    tracing::info!(
        target: "ingest",
        fetched = report.fetched,
        inserted = report.inserted,
        updated = report.updated,
        refreshed = report.refreshed,
        provider_errors = report.provider_errors,
        "ingest pass done"
    );
    Ok(report)
}
