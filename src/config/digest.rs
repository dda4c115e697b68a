// src/config/digest.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, env, fs, path::Path, path::PathBuf};

use crate::item::UNCATEGORIZED;
use crate::store::RefreshPolicy;

pub const ENV_DIGEST_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const ENV_FRESHNESS_HOURS: &str = "DIGEST_FRESHNESS_HOURS";
pub const ENV_HIGHLIGHT_MAX: &str = "DIGEST_HIGHLIGHT_MAX";
pub const ENV_BUCKET_MAX: &str = "DIGEST_BUCKET_MAX";

/// Ten years. Larger windows overflow timestamp arithmetic.
pub const MAX_WINDOW_HOURS: i64 = 24 * 365 * 10;

fn default_window_hours() -> i64 {
    26
}
fn default_highlight_max() -> usize {
    4
}
fn default_bucket_max() -> usize {
    3
}
fn default_categories() -> Vec<String> {
    ["economy", "investing", "politics", "tech"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_subject_offset() -> i32 {
    9
}

/// Knobs the selection core consumes, plus the subject-line timezone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestConfig {
    #[serde(default = "default_window_hours")]
    pub freshness_window_hours: i64,
    #[serde(default = "default_highlight_max")]
    pub highlight_max: usize,
    #[serde(default = "default_bucket_max")]
    pub bucket_max_per_category: usize,
    /// Ordered; drives bucket order in the delivered digest.
    #[serde(default = "default_categories")]
    pub recognized_categories: Vec<String>,
    /// When a re-discovered item counts as fresh again.
    #[serde(default)]
    pub refresh_policy: RefreshPolicy,
    /// UTC offset used for the date in the email subject.
    #[serde(default = "default_subject_offset")]
    pub subject_utc_offset_hours: i32,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            freshness_window_hours: default_window_hours(),
            highlight_max: default_highlight_max(),
            bucket_max_per_category: default_bucket_max(),
            recognized_categories: default_categories(),
            refresh_policy: RefreshPolicy::default(),
            subject_utc_offset_hours: default_subject_offset(),
        }
    }
}

impl DigestConfig {
    /// Load from an explicit path. TOML or JSON, chosen by extension.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading digest config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let cfg: DigestConfig = match ext.as_str() {
            "json" => serde_json::from_str(&data).context("parsing digest config json")?,
            "toml" => toml::from_str(&data).context("parsing digest config toml")?,
            other => return Err(anyhow!("unsupported digest config format: {other:?}")),
        };
        Ok(cfg.sanitized())
    }

    /// Resolution order:
    /// 1) $DIGEST_CONFIG_PATH
    /// 2) config/digest.toml
    /// 3) config/digest.json
    /// 4) built-in defaults
    ///
    /// Env overrides are applied on top in every case.
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = env::var(ENV_DIGEST_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_DIGEST_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new("config/digest.toml").exists() {
            Self::load_from_file("config/digest.toml")?
        } else if Path::new("config/digest.json").exists() {
            Self::load_from_file("config/digest.json")?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides().sanitized())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(h) = env_parse::<i64>(ENV_FRESHNESS_HOURS) {
            self.freshness_window_hours = h;
        }
        if let Some(n) = env_parse::<usize>(ENV_HIGHLIGHT_MAX) {
            self.highlight_max = n;
        }
        if let Some(n) = env_parse::<usize>(ENV_BUCKET_MAX) {
            self.bucket_max_per_category = n;
        }
        self
    }

    /// Trim and dedup categories (first occurrence wins), drop empty names
    /// and the reserved bucket name, and clamp the window to `1..=MAX_WINDOW_HOURS`.
    pub fn sanitized(mut self) -> Self {
        let mut seen = HashSet::new();
        self.recognized_categories = self
            .recognized_categories
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && c != UNCATEGORIZED)
            .filter(|c| seen.insert(c.clone()))
            .collect();

        self.freshness_window_hours = self.freshness_window_hours.clamp(1, MAX_WINDOW_HOURS);
        if !(-12..=14).contains(&self.subject_utc_offset_hours) {
            self.subject_utc_offset_hours = default_subject_offset();
        }
        self
    }

    /// Always within `1..=MAX_WINDOW_HOURS` hours, sanitized or not.
    pub fn freshness_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.freshness_window_hours.clamp(1, MAX_WINDOW_HOURS))
    }

    /// Offset for subject dates; UTC if the configured hours are out of range.
    pub fn subject_offset(&self) -> chrono::FixedOffset {
        use chrono::Offset;
        chrono::FixedOffset::east_opt(self.subject_utc_offset_hours * 3600)
            .unwrap_or_else(|| chrono::Utc.fix())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_trims_dedups_and_drops_reserved() {
        let cfg = DigestConfig {
            recognized_categories: vec![
                " economy ".into(),
                "tech".into(),
                "economy".into(),
                "".into(),
                UNCATEGORIZED.into(),
            ],
            freshness_window_hours: 0,
            ..DigestConfig::default()
        }
        .sanitized();
        assert_eq!(cfg.recognized_categories, vec!["economy", "tech"]);
        assert_eq!(cfg.freshness_window_hours, 1);
    }

    #[test]
    fn oversized_window_is_clamped_instead_of_overflowing() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("digest.toml");
        fs::write(&p, "freshness_window_hours = 3000000000").unwrap();
        let cfg = DigestConfig::load_from_file(&p).unwrap();
        assert_eq!(cfg.freshness_window_hours, MAX_WINDOW_HOURS);

        let raw = DigestConfig {
            freshness_window_hours: i64::MAX,
            ..DigestConfig::default()
        };
        assert_eq!(
            raw.freshness_window(),
            chrono::Duration::hours(MAX_WINDOW_HOURS)
        );
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("digest.toml");
        fs::write(
            &p,
            r#"
highlight_max = 2
recognized_categories = ["politics", "economy"]
refresh_policy = "on_category_change"
"#,
        )
        .unwrap();
        let cfg = DigestConfig::load_from_file(&p).unwrap();
        assert_eq!(cfg.highlight_max, 2);
        assert_eq!(cfg.bucket_max_per_category, 3);
        assert_eq!(cfg.freshness_window_hours, 26);
        assert_eq!(cfg.recognized_categories, vec!["politics", "economy"]);
        assert_eq!(cfg.refresh_policy, RefreshPolicy::OnCategoryChange);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("digest.yaml");
        fs::write(&p, "highlight_max: 2").unwrap();
        assert!(DigestConfig::load_from_file(&p).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_apply_on_top_of_defaults() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_DIGEST_CONFIG_PATH);

        env::set_var(ENV_HIGHLIGHT_MAX, "6");
        env::set_var(ENV_BUCKET_MAX, "not-a-number");
        let cfg = DigestConfig::load_default().unwrap();
        assert_eq!(cfg.highlight_max, 6);
        assert_eq!(cfg.bucket_max_per_category, 3);
        env::remove_var(ENV_HIGHLIGHT_MAX);
        env::remove_var(ENV_BUCKET_MAX);

        env::set_current_dir(&old).unwrap();
    }
}
