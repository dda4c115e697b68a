// src/delivery/mod.rs
//! Delivery of a selected digest to readers.
//!
//! Sinks receive a [`DigestRun`] (run id + payload) and decide how to render
//! and transmit it. [`SinkMux`] fans one run out to every configured sink.

pub mod cooldown;
pub mod email;
pub mod log;
pub mod recipients;
pub mod render;

use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::select::DigestPayload;

pub use cooldown::SendCooldown;
pub use email::EmailSink;
pub use log::LogSink;
pub use recipients::{mask_email, RecipientList};

/// One delivery attempt's input.
#[derive(Debug, Clone, Serialize)]
pub struct DigestRun {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub payload: DigestPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    pub sink: String,
    /// Recipients reached (or that would have been, when simulated).
    pub delivered: usize,
    pub simulated: bool,
}

#[async_trait::async_trait]
pub trait DigestSink: Send + Sync {
    fn name(&self) -> &str;
    async fn deliver(&self, run: &DigestRun) -> Result<DeliveryReceipt>;
}

/// Fan-out over several sinks. Succeeds when at least one sink did.
pub struct SinkMux {
    sinks: Vec<Box<dyn DigestSink>>,
}

impl SinkMux {
    pub fn new(sinks: Vec<Box<dyn DigestSink>>) -> Self {
        Self { sinks }
    }

    /// Email when SMTP is configured, otherwise simulation via [`LogSink`].
    pub fn from_env(subject_offset: FixedOffset) -> Result<Self> {
        let recipients = RecipientList::from_env();
        let sink: Box<dyn DigestSink> = match EmailSink::from_env(recipients.clone(), subject_offset)? {
            Some(email) => Box::new(email),
            None => {
                tracing::warn!(
                    recipients = recipients.len(),
                    "SMTP not configured; digests will be simulated"
                );
                Box::new(LogSink::new(recipients.len()))
            }
        };
        Ok(Self::new(vec![sink]))
    }
}

#[async_trait::async_trait]
impl DigestSink for SinkMux {
    fn name(&self) -> &str {
        "mux"
    }

    async fn deliver(&self, run: &DigestRun) -> Result<DeliveryReceipt> {
        let mut delivered = 0usize;
        let mut simulated = true;
        let mut ok = 0usize;

        for s in &self.sinks {
            match s.deliver(run).await {
                Ok(r) => {
                    tracing::info!(
                        sink = s.name(),
                        run_id = %run.run_id,
                        delivered = r.delivered,
                        simulated = r.simulated,
                        "digest delivered"
                    );
                    delivered += r.delivered;
                    simulated &= r.simulated;
                    ok += 1;
                }
                Err(e) => {
                    tracing::warn!(sink = s.name(), run_id = %run.run_id, error = ?e, "sink failed");
                }
            }
        }

        if ok == 0 {
            return Err(anyhow!(
                "no sink accepted run {} ({} configured)",
                run.run_id,
                self.sinks.len()
            ));
        }
        Ok(DeliveryReceipt {
            sink: self.name().to_string(),
            delivered,
            simulated,
        })
    }
}
