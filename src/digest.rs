// src/digest.rs
//! # Digest run
//! One delivery run: snapshot the store once, select, hand the payload to the
//! sink. Empty outcomes are reported as such and never reach the sink.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::config::DigestConfig;
use crate::delivery::{DigestRun, DigestSink};
use crate::history::{RunHistory, RunRecord, RunStatus, Trigger};
use crate::select::{select, window_start, Selection};
use crate::store::ItemStore;

/// Upper bound on the single store read per run.
pub const STORE_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("digest_runs_total", "Digest runs started.");
        describe_counter!(
            "digest_no_content_total",
            "Runs with nothing inside the freshness window."
        );
        describe_counter!(
            "digest_empty_payload_total",
            "Runs whose selection came out empty."
        );
        describe_counter!(
            "digest_items_selected_total",
            "Items placed in delivered digests."
        );
        describe_histogram!("digest_select_ms", "Selection time in milliseconds.");
    });
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    NoContent {
        seed: u64,
    },
    EmptyPayload {
        seed: u64,
        pool: usize,
    },
    Delivered {
        run_id: Uuid,
        seed: u64,
        pool: usize,
        highlights: usize,
        bucketed: usize,
        buckets: usize,
        delivered: usize,
        simulated: bool,
        fingerprint: String,
    },
}

impl RunOutcome {
    pub fn status(&self) -> RunStatus {
        match self {
            RunOutcome::NoContent { .. } => RunStatus::NoContent,
            RunOutcome::EmptyPayload { .. } => RunStatus::EmptyPayload,
            RunOutcome::Delivered { .. } => RunStatus::Delivered,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, RunOutcome::Delivered { .. })
    }

    pub fn to_record(&self, at: DateTime<Utc>, trigger: Trigger) -> RunRecord {
        let mut rec = RunRecord::new(at, trigger, self.status());
        match self {
            RunOutcome::NoContent { seed } | RunOutcome::EmptyPayload { seed, .. } => {
                rec.seed = Some(*seed);
            }
            RunOutcome::Delivered {
                run_id,
                seed,
                highlights,
                bucketed,
                delivered,
                simulated,
                fingerprint,
                ..
            } => {
                rec.run_id = Some(*run_id);
                rec.seed = Some(*seed);
                rec.highlights = *highlights;
                rec.bucketed = *bucketed;
                rec.delivered = *delivered;
                rec.simulated = *simulated;
                rec.fingerprint = Some(fingerprint.clone());
            }
        }
        rec
    }
}

/// Seed derived from the clock, for production runs.
pub fn clock_seed(now: DateTime<Utc>) -> u64 {
    now.timestamp_nanos_opt()
        .map(|n| n as u64)
        .unwrap_or_else(|| now.timestamp() as u64)
}

/// Run one digest as of `now`, shuffling categories with `seed`.
///
/// Store and sink failures are returned as errors; nothing is retried here.
pub async fn run_digest(
    store: &dyn ItemStore,
    cfg: &DigestConfig,
    sink: &dyn DigestSink,
    now: DateTime<Utc>,
    seed: u64,
) -> Result<RunOutcome> {
    ensure_metrics_described();
    counter!("digest_runs_total").increment(1);

    let since = window_start(now, cfg.freshness_window());
    let snapshot = tokio::time::timeout(STORE_FETCH_TIMEOUT, store.fetch_items_since(since))
        .await
        .map_err(|_| anyhow!("item store fetch timed out after {STORE_FETCH_TIMEOUT:?}"))?
        .context("fetching items from store")?;

    let t0 = std::time::Instant::now();
    let mut rng = StdRng::seed_from_u64(seed);
    let selection = select(snapshot, now, cfg, &mut rng);
    histogram!("digest_select_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    let (pool, payload) = match selection {
        Selection::NoContent => {
            counter!("digest_no_content_total").increment(1);
            tracing::warn!(
                seed,
                window_hours = cfg.freshness_window_hours,
                "no content in freshness window; nothing to deliver"
            );
            return Ok(RunOutcome::NoContent { seed });
        }
        Selection::Ready { pool, payload } => (pool, payload),
    };

    if payload.is_empty() {
        counter!("digest_empty_payload_total").increment(1);
        tracing::warn!(
            seed,
            pool,
            highlight_max = cfg.highlight_max,
            bucket_max = cfg.bucket_max_per_category,
            "selection produced an empty digest; skipping delivery"
        );
        return Ok(RunOutcome::EmptyPayload { seed, pool });
    }

    let run = DigestRun {
        run_id: Uuid::new_v4(),
        created_at: now,
        payload,
    };
    let highlights = run.payload.highlights.len();
    let bucketed = run.payload.bucketed_count();
    let buckets = run.payload.buckets.len();
    let fingerprint = run.payload.fingerprint();

    tracing::info!(
        run_id = %run.run_id,
        seed,
        pool,
        highlights,
        bucketed,
        buckets,
        %fingerprint,
        "digest selected"
    );

    let receipt = sink
        .deliver(&run)
        .await
        .with_context(|| format!("delivering run {}", run.run_id))?;
    counter!("digest_items_selected_total").increment((highlights + bucketed) as u64);

    Ok(RunOutcome::Delivered {
        run_id: run.run_id,
        seed,
        pool,
        highlights,
        bucketed,
        buckets,
        delivered: receipt.delivered,
        simulated: receipt.simulated,
        fingerprint,
    })
}

/// [`run_digest`] plus a history record, failures included.
pub async fn run_and_record(
    store: &dyn ItemStore,
    cfg: &DigestConfig,
    sink: &dyn DigestSink,
    history: &RunHistory,
    trigger: Trigger,
    now: DateTime<Utc>,
    seed: u64,
) -> Result<RunOutcome> {
    match run_digest(store, cfg, sink, now, seed).await {
        Ok(outcome) => {
            history.push(outcome.to_record(now, trigger));
            Ok(outcome)
        }
        Err(e) => {
            tracing::error!(error = ?e, seed, "digest run failed");
            let mut rec = RunRecord::new(now, trigger, RunStatus::Failed);
            rec.seed = Some(seed);
            rec.error = Some(format!("{e:#}"));
            history.push(rec);
            Err(e)
        }
    }
}
