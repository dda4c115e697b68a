// src/api.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::config::DigestConfig;
use crate::delivery::{DigestSink, SendCooldown};
use crate::digest::{clock_seed, run_and_record};
use crate::history::{RunHistory, RunRecord, Trigger};
use crate::item::Item;
use crate::select::{filter_fresh, rank, window_start};
use crate::store::ItemStore;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";
pub const ENV_ADMIN_TOKEN: &str = "ADMIN_TOKEN";

const CONTENTS_DEFAULT_LIMIT: usize = 6;
const CONTENTS_MAX_LIMIT: usize = 50;
const ONBOARDING_LOOKBACK_HOURS: i64 = 72;
const ONBOARDING_SCAN_LIMIT: usize = 200;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ItemStore>,
    pub sink: Arc<dyn DigestSink>,
    pub config: Arc<DigestConfig>,
    pub history: Arc<RunHistory>,
    /// Held for the duration of every digest run.
    pub cooldown: Arc<Mutex<SendCooldown>>,
    /// `None` disables `/admin/send` entirely.
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ItemStore>,
        sink: Arc<dyn DigestSink>,
        config: DigestConfig,
        cooldown_secs: i64,
    ) -> Self {
        Self {
            store,
            sink,
            config: Arc::new(config),
            history: Arc::new(RunHistory::with_capacity(500)),
            cooldown: Arc::new(Mutex::new(SendCooldown::new(cooldown_secs))),
            admin_token: std::env::var(ENV_ADMIN_TOKEN).ok().filter(|t| !t.is_empty()),
        }
    }

    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token;
        self
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/contents", get(contents))
        .route("/onboarding/contents", get(onboarding_contents))
        .route("/admin/send", post(admin_send))
        .route("/debug/runs", get(debug_runs))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct ContentsOut {
    contents: Vec<Item>,
}

#[derive(Deserialize)]
struct ContentsQuery {
    #[serde(default)]
    limit: Option<usize>,
}

fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": msg.into() }))).into_response()
}

/// Top fresh items by popularity.
async fn contents(State(state): State<AppState>, Query(q): Query<ContentsQuery>) -> Response {
    let now = Utc::now();
    let limit = q
        .limit
        .unwrap_or(CONTENTS_DEFAULT_LIMIT)
        .clamp(1, CONTENTS_MAX_LIMIT);

    match state
        .store
        .fetch_items_since(window_start(now, state.config.freshness_window()))
        .await
    {
        Ok(items) => {
            let mut ranked = rank(filter_fresh(items, now, state.config.freshness_window()));
            ranked.truncate(limit);
            Json(ContentsOut { contents: ranked }).into_response()
        }
        Err(e) => {
            tracing::error!(error = ?e, "contents: store fetch failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch contents")
        }
    }
}

/// Newest item of each channel seen in the last three days.
async fn onboarding_contents(State(state): State<AppState>) -> Response {
    let since = Utc::now() - Duration::hours(ONBOARDING_LOOKBACK_HOURS);
    match state.store.fetch_items_since(since).await {
        Ok(items) => Json(ContentsOut {
            contents: newest_per_channel(items),
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = ?e, "onboarding: store fetch failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch contents")
        }
    }
}

/// Expects `items` newest first, as the store returns them.
fn newest_per_channel(items: Vec<Item>) -> Vec<Item> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .take(ONBOARDING_SCAN_LIMIT)
        .filter(|it| !it.channel.is_empty() && seen.insert(it.channel.clone()))
        .collect()
}

#[derive(Deserialize)]
struct SendQuery {
    #[serde(default)]
    seed: Option<u64>,
}

/// Manual digest run. Bypasses the send cooldown but records into it.
async fn admin_send(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<SendQuery>,
) -> Response {
    let presented = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    let authorized = matches!(
        (state.admin_token.as_deref(), presented),
        (Some(expected), Some(got)) if expected == got
    );
    if !authorized {
        tracing::warn!("admin send rejected: bad or missing token");
        return error_response(StatusCode::UNAUTHORIZED, "unauthorized");
    }

    let mut cooldown = state.cooldown.lock().await;
    let now = Utc::now();
    let seed = q.seed.unwrap_or_else(|| clock_seed(now));
    match run_and_record(
        state.store.as_ref(),
        &state.config,
        state.sink.as_ref(),
        &state.history,
        Trigger::Manual,
        now,
        seed,
    )
    .await
    {
        Ok(outcome) => {
            if outcome.is_delivered() {
                cooldown.record_sent(now);
            }
            Json(outcome).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")),
    }
}

async fn debug_runs(State(state): State<AppState>) -> Json<Vec<RunRecord>> {
    Json(state.history.snapshot_last_n(20))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemId;

    fn it(id: &str, channel: &str, age_min: i64) -> Item {
        Item {
            id: ItemId::new("youtube", id),
            channel: channel.into(),
            category: None,
            popularity: None,
            ingested_at: Utc::now() - Duration::minutes(age_min),
            title: id.into(),
            url: String::new(),
            thumbnail: None,
            description: String::new(),
            published_at: None,
        }
    }

    #[test]
    fn onboarding_keeps_first_item_per_channel() {
        let items = vec![
            it("a1", "Alpha", 1),
            it("b1", "Beta", 2),
            it("a2", "Alpha", 3),
            it("x", "", 4),
        ];
        let out = newest_per_channel(items);
        let ids: Vec<_> = out.iter().map(|i| i.id.original_id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b1"]);
    }
}
