//! Video digest service: binary entrypoint.
//! Boots the Axum HTTP server and the ingest/digest schedulers on shuttle.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use std::sync::Arc;

use video_digest::api::{self, AppState};
use video_digest::delivery::SinkMux;
use video_digest::ingest::{config::load_sources_default, providers::build_providers};
use video_digest::metrics::Metrics;
use video_digest::scheduler::{spawn_digest_scheduler, spawn_ingest_scheduler, SchedulerCfg};
use video_digest::store::{file::FileItemStore, ItemStore};
use video_digest::{init_tracing, DigestConfig};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = DigestConfig::load_default().context("loading digest config")?;
    let sched = SchedulerCfg::from_env();
    let metrics = Metrics::init(&cfg)?;

    let store: Arc<dyn ItemStore> = Arc::new(
        FileItemStore::open_default(cfg.refresh_policy)
            .await
            .context("opening item store")?,
    );
    let sink = Arc::new(SinkMux::from_env(cfg.subject_offset())?);

    let sources = load_sources_default().context("loading ingest sources")?;
    let providers = build_providers(&sources);
    tracing::info!(
        providers = providers.len(),
        categories = ?cfg.recognized_categories,
        window_hours = cfg.freshness_window_hours,
        "digest service starting"
    );

    let state = AppState::new(store.clone(), sink, cfg, sched.cooldown_secs);
    if state.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN not set; /admin/send is disabled");
    }

    if providers.is_empty() {
        tracing::warn!("no ingest sources configured; ingest scheduler not started");
    } else {
        spawn_ingest_scheduler(sched.ingest_interval_secs, providers, store);
    }
    spawn_digest_scheduler(sched.digest_interval_secs, state.clone());

    let router = api::create_router(state).merge(metrics.router());
    Ok(router.into())
}
