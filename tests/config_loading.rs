// tests/config_loading.rs
use std::{env, fs};
use video_digest::config::digest::{
    ENV_BUCKET_MAX, ENV_DIGEST_CONFIG_PATH, ENV_FRESHNESS_HOURS, ENV_HIGHLIGHT_MAX,
};
use video_digest::ingest::config::{load_sources_default, load_sources_from};
use video_digest::store::RefreshPolicy;
use video_digest::DigestConfig;

fn clear_env() {
    for k in [
        "INGEST_SOURCES_PATH",
        ENV_DIGEST_CONFIG_PATH,
        ENV_FRESHNESS_HOURS,
        ENV_HIGHLIGHT_MAX,
        ENV_BUCKET_MAX,
    ] {
        env::remove_var(k);
    }
}

#[test]
fn sources_parse_from_toml_and_json_files() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("sources.toml");
    fs::write(
        &p_toml,
        r#"
[[sources]]
name = "Syuka World"
channel_id = "UCsJ6RuBiTVWRX156FVbeaGg"
category = " economy "
limit = 2
"#,
    )
    .unwrap();
    let v = load_sources_from(&p_toml).unwrap();
    assert_eq!(v.len(), 1);
    assert_eq!(v[0].category.as_deref(), Some("economy"));
    assert_eq!(v[0].limit, 2);

    let p_json = dir.path().join("sources.json");
    fs::write(
        &p_json,
        r#"{"sources": [{"name": "MK Invest", "feed_url": "https://example.com/mk.xml"}]}"#,
    )
    .unwrap();
    let vj = load_sources_from(&p_json).unwrap();
    assert_eq!(vj[0].name, "MK Invest");
    assert_eq!(vj[0].source_type, "youtube");
}

#[serial_test::serial]
#[test]
fn sources_default_uses_env_then_fallbacks() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // Nothing configured: no sources.
    assert!(load_sources_default().unwrap().is_empty());

    // ./config/sources.toml fallback.
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(
        cfg_dir.join("sources.toml"),
        "[[sources]]\nname = \"A\"\nchannel_id = \"UC1\"\n",
    )
    .unwrap();
    let v = load_sources_default().unwrap();
    assert_eq!(v.len(), 1);
    assert_eq!(v[0].name, "A");

    // Env wins.
    let p_env = tmp.path().join("other.json");
    fs::write(&p_env, r#"[{"name": "B", "channel_id": "UC2"}]"#).unwrap();
    env::set_var("INGEST_SOURCES_PATH", p_env.display().to_string());
    assert_eq!(load_sources_default().unwrap()[0].name, "B");

    // Env pointing nowhere is an error, not a silent fallback.
    env::set_var("INGEST_SOURCES_PATH", tmp.path().join("missing.toml"));
    assert!(load_sources_default().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn digest_config_default_chain_and_overrides() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    assert_eq!(DigestConfig::load_default().unwrap(), DigestConfig::default());

    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(
        cfg_dir.join("digest.toml"),
        r#"
highlight_max = 2
recognized_categories = ["tech", "economy", "tech"]
refresh_policy = "on_category_change"
"#,
    )
    .unwrap();
    let cfg = DigestConfig::load_default().unwrap();
    assert_eq!(cfg.highlight_max, 2);
    assert_eq!(cfg.recognized_categories, vec!["tech", "economy"]);
    assert_eq!(cfg.refresh_policy, RefreshPolicy::OnCategoryChange);
    assert_eq!(cfg.freshness_window_hours, 26);

    env::set_var(ENV_FRESHNESS_HOURS, "48");
    env::set_var(ENV_BUCKET_MAX, "5");
    let cfg = DigestConfig::load_default().unwrap();
    assert_eq!(cfg.freshness_window_hours, 48);
    assert_eq!(cfg.bucket_max_per_category, 5);
    assert_eq!(cfg.highlight_max, 2);

    clear_env();
    env::set_current_dir(&old).unwrap();
}
