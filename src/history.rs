//! history.rs: capped in-memory log of digest runs, newest last.
//! Backs `/debug/runs` and lets operators see empty and failed runs, not just sends.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Scheduled,
    Manual,
    Cli,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Delivered,
    NoContent,
    EmptyPayload,
    Suppressed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub at: DateTime<Utc>,
    pub trigger: Trigger,
    pub status: RunStatus,
    pub run_id: Option<Uuid>,
    pub seed: Option<u64>,
    pub highlights: usize,
    pub bucketed: usize,
    pub delivered: usize,
    pub simulated: bool,
    pub fingerprint: Option<String>,
    pub error: Option<String>,
}

impl RunRecord {
    pub fn new(at: DateTime<Utc>, trigger: Trigger, status: RunStatus) -> Self {
        Self {
            at,
            trigger,
            status,
            run_id: None,
            seed: None,
            highlights: 0,
            bucketed: 0,
            delivered: 0,
            simulated: false,
            fingerprint: None,
            error: None,
        }
    }
}

#[derive(Debug)]
pub struct RunHistory {
    inner: Mutex<Vec<RunRecord>>,
    cap: usize,
}

impl RunHistory {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Vec::with_capacity(cap.min(10_000))),
            cap: cap.min(10_000),
        }
    }

    pub fn push(&self, rec: RunRecord) {
        let mut v = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        v.push(rec);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    pub fn snapshot_last_n(&self, n: usize) -> Vec<RunRecord> {
        let v = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let start = v.len().saturating_sub(n);
        v[start..].to_vec()
    }

    pub fn last(&self) -> Option<RunRecord> {
        self.snapshot_last_n(1).pop()
    }
}
