// src/delivery/email.rs
use anyhow::{anyhow, Context, Result};
use chrono::FixedOffset;
use lettre::message::{Mailbox, Message, MultiPart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::recipients::{mask_email, RecipientList};
use super::render::{render_html, render_text, subject};
use super::{DeliveryReceipt, DigestRun, DigestSink};

/// SMTP settings read from the environment.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl SmtpSettings {
    /// `None` when `SMTP_USER` or `SMTP_PASS` is missing (simulation mode).
    pub fn from_env() -> Option<Self> {
        let user = std::env::var("SMTP_USER").ok().filter(|v| !v.is_empty())?;
        let pass = std::env::var("SMTP_PASS").ok().filter(|v| !v.is_empty())?;
        let host = std::env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string());
        let port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(587);
        let from = std::env::var("DIGEST_EMAIL_FROM").unwrap_or_else(|_| user.clone());
        Some(Self {
            host,
            port,
            user,
            pass,
            from,
        })
    }
}

/// Sends one message per recipient over a STARTTLS relay.
pub struct EmailSink {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: RecipientList,
    subject_offset: FixedOffset,
}

impl EmailSink {
    pub fn new(
        settings: SmtpSettings,
        recipients: RecipientList,
        subject_offset: FixedOffset,
    ) -> Result<Self> {
        let creds = Credentials::new(settings.user, settings.pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .with_context(|| format!("invalid SMTP_HOST {}", settings.host))?
            .port(settings.port)
            .credentials(creds)
            .build();
        let from = settings
            .from
            .parse()
            .with_context(|| format!("invalid sender address {}", settings.from))?;
        Ok(Self {
            mailer,
            from,
            recipients,
            subject_offset,
        })
    }

    pub fn from_env(recipients: RecipientList, subject_offset: FixedOffset) -> Result<Option<Self>> {
        match SmtpSettings::from_env() {
            Some(s) => Self::new(s, recipients, subject_offset).map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl DigestSink for EmailSink {
    fn name(&self) -> &str {
        "email"
    }

    async fn deliver(&self, run: &DigestRun) -> Result<DeliveryReceipt> {
        if self.recipients.is_empty() {
            return Err(anyhow!("no recipients configured"));
        }

        let subject = subject(run.created_at, self.subject_offset);
        let plain = render_text(&run.payload);
        let html = render_html(&run.payload, &subject);

        let mut sent = 0usize;
        for addr in self.recipients.emails() {
            let to: Mailbox = match addr.parse() {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(to = %mask_email(addr), error = %e, "unparsable recipient");
                    continue;
                }
            };
            let msg = Message::builder()
                .from(self.from.clone())
                .to(to)
                .subject(subject.clone())
                .multipart(MultiPart::alternative_plain_html(plain.clone(), html.clone()))
                .context("build email")?;

            match self.mailer.send(msg).await {
                Ok(_) => {
                    tracing::debug!(to = %mask_email(addr), run_id = %run.run_id, "sent");
                    sent += 1;
                }
                Err(e) => {
                    tracing::warn!(to = %mask_email(addr), run_id = %run.run_id, error = %e, "send failed");
                }
            }
        }

        if sent == 0 {
            return Err(anyhow!(
                "email delivery failed for all {} recipients",
                self.recipients.len()
            ));
        }
        Ok(DeliveryReceipt {
            sink: self.name().to_string(),
            delivered: sent,
            simulated: false,
        })
    }
}
