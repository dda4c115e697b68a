//! One-shot ingest + digest for cron-style deployments.
//!
//! Usage: `run_digest [--skip-ingest] [--seed <u64>]`

use anyhow::{bail, Context, Result};
use chrono::Utc;

use video_digest::delivery::SinkMux;
use video_digest::digest::{clock_seed, run_and_record};
use video_digest::history::{RunHistory, Trigger};
use video_digest::ingest::{self, config::load_sources_default, providers::build_providers};
use video_digest::store::file::FileItemStore;
use video_digest::{init_tracing, DigestConfig};

struct Args {
    skip_ingest: bool,
    seed: Option<u64>,
}

fn parse_args() -> Result<Args> {
    let mut out = Args {
        skip_ingest: false,
        seed: None,
    };
    let mut it = std::env::args().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--skip-ingest" => out.skip_ingest = true,
            "--seed" => {
                let v = it.next().context("--seed needs a value")?;
                out.seed = Some(v.parse().with_context(|| format!("bad seed {v}"))?);
            }
            other => bail!("unknown argument {other}"),
        }
    }
    Ok(out)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let args = parse_args()?;

    let cfg = DigestConfig::load_default().context("loading digest config")?;
    let store = FileItemStore::open_default(cfg.refresh_policy)
        .await
        .context("opening item store")?;

    if !args.skip_ingest {
        let sources = load_sources_default().context("loading ingest sources")?;
        let providers = build_providers(&sources);
        let report = ingest::run_once(&providers, &store, Utc::now()).await?;
        println!("{}", serde_json::to_string(&report)?);
    }

    let sink = SinkMux::from_env(cfg.subject_offset())?;
    let history = RunHistory::with_capacity(1);
    let now = Utc::now();
    let seed = args.seed.unwrap_or_else(|| clock_seed(now));
    let outcome = run_and_record(&store, &cfg, &sink, &history, Trigger::Cli, now, seed).await?;
    println!("{}", serde_json::to_string(&outcome)?);
    Ok(())
}
