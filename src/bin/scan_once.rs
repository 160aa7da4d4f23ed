//! One-shot scan runner for operations and debugging: scans a single
//! source (or every enabled source) and exits. Runs scans inline, so the
//! scheduler's overlap guard and concurrency bound do not apply.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser as ClapParser;
use tracing::info;

use compgather::config::AppConfig;
use compgather::geocoder::Geocoder;
use compgather::matcher::VenueMatcher;
use compgather::parsers::ParserContext;
use compgather::scanner::{self, ScanTrigger, Scanner};
use compgather::store::{self, Db};
use compgather::util::env as env_util;
use compgather::util::http::HttpClient;

#[derive(Debug, ClapParser)]
#[command(name = "scan_once", about = "Run one scan and exit")]
struct Args {
    /// Source key to scan (e.g. "equipe_online")
    #[arg(long, conflicts_with = "all")]
    source: Option<String>,

    /// Scan every enabled source sequentially
    #[arg(long)]
    all: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    let args = Args::parse();
    let config = AppConfig::from_env();
    compgather::logging::init_tracing(&format!("{},sqlx=warn", config.log_level))?;

    let database_url = env_util::db_url()?;
    let db = Db::connect(&database_url, 5)
        .await
        .context("database connection failed")?;
    scanner::seed_all(&db).await?;

    let http = HttpClient::from_env()?;
    let geocoder = Arc::new(Geocoder::new(
        http.clone(),
        config.geocoder_primary_url.clone(),
        config.geocoder_fallback_url.clone(),
    ));
    geocoder.set_home_postcode(&config.home_postcode).await;

    let scanner = Scanner::new(
        db.clone(),
        Arc::new(VenueMatcher::new(db.clone())),
        geocoder,
        ParserContext {
            http,
            extractor_url: config.generic_extractor_url.clone(),
            extractor_model: config.generic_extractor_model.clone(),
        },
        Duration::from_secs(config.scan_timeout_seconds),
    );

    let sources = store::sources::enabled_sources(&db).await?;
    let selected: Vec<_> = match (&args.source, args.all) {
        (Some(key), _) => {
            let matched: Vec<_> = sources.into_iter().filter(|s| &s.key == key).collect();
            if matched.is_empty() {
                bail!("no enabled source with key '{key}'");
            }
            matched
        }
        (None, true) => sources,
        (None, false) => bail!("pass --source <key> or --all"),
    };

    for source in selected {
        let scan_id = store::scans::create_scan(&db, source.id).await?;
        info!(source = %source.key, scan_id, "running scan");
        scanner
            .run_scan(source.id, scan_id, ScanTrigger::Manual)
            .await?;
    }
    Ok(())
}
