// src/delivery/log.rs
use anyhow::Result;

use super::{DeliveryReceipt, DigestRun, DigestSink};

/// Simulation sink: logs what would have been sent.
pub struct LogSink {
    recipients: usize,
}

impl LogSink {
    pub fn new(recipients: usize) -> Self {
        Self { recipients }
    }
}

#[async_trait::async_trait]
impl DigestSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, run: &DigestRun) -> Result<DeliveryReceipt> {
        for it in &run.payload.highlights {
            tracing::info!(run_id = %run.run_id, channel = %it.channel, title = %it.title, "highlight");
        }
        for b in &run.payload.buckets {
            tracing::info!(
                run_id = %run.run_id,
                category = %b.category,
                items = b.items.len(),
                "bucket"
            );
        }
        tracing::info!(
            run_id = %run.run_id,
            recipients = self.recipients,
            "[simulated] digest would have been sent"
        );
        Ok(DeliveryReceipt {
            sink: self.name().to_string(),
            delivered: self.recipients,
            simulated: true,
        })
    }
}
