// src/delivery/recipients.rs
use std::collections::BTreeSet;

pub const ENV_RECIPIENTS: &str = "DIGEST_RECIPIENTS";

/// Deduplicated, lowercased recipient addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientList {
    emails: Vec<String>,
}

impl RecipientList {
    /// Parse a comma/semicolon/whitespace separated list. Entries that do not
    /// look like `local@domain` are dropped with a warning.
    pub fn parse(raw: &str) -> Self {
        let mut set = BTreeSet::new();
        for part in raw.split([',', ';', ' ', '\n', '\t']) {
            let t = part.trim().to_ascii_lowercase();
            if t.is_empty() {
                continue;
            }
            if looks_like_email(&t) {
                set.insert(t);
            } else {
                tracing::warn!(entry = %mask_email(&t), "invalid recipient skipped");
            }
        }
        Self {
            emails: set.into_iter().collect(),
        }
    }

    pub fn from_env() -> Self {
        Self::parse(&std::env::var(ENV_RECIPIENTS).unwrap_or_default())
    }

    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && domain.contains('.')
        }
        None => false,
    }
}

/// `alice@example.com` → `al***@example.com`, for logs.
pub fn mask_email(email: &str) -> String {
    let Some((name, domain)) = email.split_once('@') else {
        return "***".to_string();
    };
    let n = name.chars().count();
    let masked: String = if n > 2 {
        name.chars()
            .take(2)
            .chain(std::iter::repeat('*').take(n - 2))
            .collect()
    } else {
        format!("{name}**")
    };
    format!("{masked}@{domain}")
}
