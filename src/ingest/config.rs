// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "INGEST_SOURCES_PATH";
const YOUTUBE_FEED_BASE: &str = "https://www.youtube.com/feeds/videos.xml?channel_id=";

fn default_source_type() -> String {
    "youtube".to_string()
}
fn default_limit() -> usize {
    3
}

/// One channel to ingest from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_type")]
    pub source_type: String,
    /// Channel name as shown to readers; also the dedup key for selection.
    pub name: String,
    #[serde(default)]
    pub feed_url: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Newest entries to take per pass.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl SourceConfig {
    /// Explicit `feed_url`, else the public feed for `channel_id`.
    pub fn resolve_feed_url(&self) -> Option<String> {
        if let Some(u) = self.feed_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            return Some(u.to_string());
        }
        self.channel_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| format!("{YOUTUBE_FEED_BASE}{id}"))
    }
}

/// Load sources from an explicit path. Supports TOML or JSON formats.
pub fn load_sources_from(path: &Path) -> Result<Vec<SourceConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

/// Load sources using env var + fallbacks:
/// 1) $INGEST_SOURCES_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
pub fn load_sources_default() -> Result<Vec<SourceConfig>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        } else {
            return Err(anyhow!("INGEST_SOURCES_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(Vec::new())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<SourceConfig>> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("[[sources]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported sources format"))
}

#[derive(Deserialize)]
struct SourcesDoc {
    sources: Vec<SourceConfig>,
}

fn parse_toml(s: &str) -> Result<Vec<SourceConfig>> {
    let v: SourcesDoc = toml::from_str(s)?;
    Ok(clean_list(v.sources))
}

fn parse_json(s: &str) -> Result<Vec<SourceConfig>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum JsonSources {
        List(Vec<SourceConfig>),
        Doc(SourcesDoc),
    }
    let v: JsonSources = serde_json::from_str(s)?;
    let list = match v {
        JsonSources::List(l) => l,
        JsonSources::Doc(d) => d.sources,
    };
    Ok(clean_list(list))
}

/// Trim names, drop entries without a name or feed, keep the first entry per
/// `(source_type, name)`.
fn clean_list(items: Vec<SourceConfig>) -> Vec<SourceConfig> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for mut it in items {
        it.name = it.name.trim().to_string();
        it.source_type = it.source_type.trim().to_ascii_lowercase();
        it.category = it
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if it.name.is_empty() || it.resolve_feed_url().is_none() {
            tracing::warn!(name = %it.name, "source without name or feed skipped");
            continue;
        }
        if seen.insert((it.source_type.clone(), it.name.clone())) {
            out.push(it);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_and_json_shapes_parse() {
        let toml = r#"
[[sources]]
name = " Alpha Channel "
channel_id = "UC123"
category = "economy"

[[sources]]
name = "Alpha Channel"
feed_url = "https://example.com/dup.xml"

[[sources]]
name = ""
feed_url = "https://example.com/anon.xml"
"#;
        let out = parse_toml(toml).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Alpha Channel");
        assert_eq!(out[0].source_type, "youtube");
        assert_eq!(out[0].limit, 3);
        assert_eq!(
            out[0].resolve_feed_url().as_deref(),
            Some("https://www.youtube.com/feeds/videos.xml?channel_id=UC123")
        );

        let json = r#"[{"name": "Beta", "feed_url": "https://example.com/b.xml", "limit": 5}]"#;
        let out = parse_json(json).unwrap();
        assert_eq!(out[0].limit, 5);
        assert_eq!(out[0].category, None);
    }

    #[test]
    fn source_without_feed_is_dropped() {
        let json = r#"{"sources": [{"name": "NoFeed"}]}"#;
        assert!(parse_sources(json, "json").unwrap().is_empty());
    }
}
