// src/delivery/cooldown.rs
use chrono::{DateTime, Duration, Utc};

/// Gate for scheduled sends so a restart or a short interval does not mail
/// readers twice in one day.
/// - First send always allowed.
/// - Inside cooldown, sends are suppressed.
/// - State is updated explicitly via `record_sent` after a successful delivery.
#[derive(Debug, Clone, Default)]
pub struct SendCooldown {
    cooldown: Duration,
    last_sent_at: Option<DateTime<Utc>>,
}

impl SendCooldown {
    /// `cooldown_secs` < 0 is treated as 0 (no cooldown).
    pub fn new(cooldown_secs: i64) -> Self {
        Self {
            cooldown: Duration::seconds(cooldown_secs.max(0)),
            last_sent_at: None,
        }
    }

    /// Does NOT mutate state.
    pub fn should_send(&self, now: DateTime<Utc>) -> bool {
        match self.last_sent_at {
            None => true,
            Some(ts) => now.signed_duration_since(ts) >= self.cooldown,
        }
    }

    pub fn record_sent(&mut self, now: DateTime<Utc>) {
        self.last_sent_at = Some(now);
    }

    pub fn last_sent_at(&self) -> Option<DateTime<Utc>> {
        self.last_sent_at
    }
}
