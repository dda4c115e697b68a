// src/scheduler.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::AppState;
use crate::digest::{clock_seed, run_and_record, RunOutcome};
use crate::history::{RunRecord, RunStatus, Trigger};
use crate::ingest::{self, types::ItemProvider};
use crate::store::ItemStore;

pub const ENV_INGEST_INTERVAL_SECS: &str = "INGEST_INTERVAL_SECS";
pub const ENV_DIGEST_INTERVAL_SECS: &str = "DIGEST_INTERVAL_SECS";
pub const ENV_DIGEST_COOLDOWN_SECS: &str = "DIGEST_COOLDOWN_SECS";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerCfg {
    pub ingest_interval_secs: u64,
    pub digest_interval_secs: u64,
    pub cooldown_secs: i64,
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self {
            ingest_interval_secs: 3_600,
            digest_interval_secs: 86_400,
            cooldown_secs: 72_000,
        }
    }
}

impl SchedulerCfg {
    /// Defaults overridden by env; zero intervals are bumped to one second.
    pub fn from_env() -> Self {
        let d = Self::default();
        let parse_u64 = |k: &str| std::env::var(k).ok().and_then(|v| v.trim().parse::<u64>().ok());
        Self {
            ingest_interval_secs: parse_u64(ENV_INGEST_INTERVAL_SECS)
                .unwrap_or(d.ingest_interval_secs)
                .max(1),
            digest_interval_secs: parse_u64(ENV_DIGEST_INTERVAL_SECS)
                .unwrap_or(d.digest_interval_secs)
                .max(1),
            cooldown_secs: std::env::var(ENV_DIGEST_COOLDOWN_SECS)
                .ok()
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(d.cooldown_secs),
        }
    }
}

/// Periodic ingest over `providers`. First pass runs immediately.
pub fn spawn_ingest_scheduler(
    interval_secs: u64,
    providers: Vec<Box<dyn ItemProvider>>,
    store: Arc<dyn ItemStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            ticker.tick().await;
            counter!("ingest_runs_total").increment(1);
            if let Err(e) = ingest::run_once(&providers, store.as_ref(), Utc::now()).await {
                tracing::error!(target: "ingest", error = ?e, "scheduled ingest failed");
            }
        }
    })
}

/// Periodic digest runs gated by the shared send cooldown.
pub fn spawn_digest_scheduler(interval_secs: u64, state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        // The first tick fires at once; skip it so a restart does not send.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let now = Utc::now();
            if let Err(e) = scheduled_digest(&state, now, clock_seed(now)).await {
                tracing::error!(error = ?e, "scheduled digest failed");
            }
        }
    })
}

/// One scheduled run. `Ok(None)` when the cooldown suppressed it.
///
/// The cooldown lock is held for the whole run, so a manual send and a
/// scheduled tick never deliver concurrently.
pub async fn scheduled_digest(
    state: &AppState,
    now: DateTime<Utc>,
    seed: u64,
) -> Result<Option<RunOutcome>> {
    let mut cooldown = state.cooldown.lock().await;
    if !cooldown.should_send(now) {
        tracing::info!(
            last_sent_at = ?cooldown.last_sent_at(),
            "scheduled digest suppressed by cooldown"
        );
        state
            .history
            .push(RunRecord::new(now, Trigger::Scheduled, RunStatus::Suppressed));
        return Ok(None);
    }

    let outcome = run_and_record(
        state.store.as_ref(),
        &state.config,
        state.sink.as_ref(),
        &state.history,
        Trigger::Scheduled,
        now,
        seed,
    )
    .await?;

    if outcome.is_delivered() {
        cooldown.record_sent(now);
    }
    Ok(Some(outcome))
}
