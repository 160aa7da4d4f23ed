use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use compgather::api::{ApiServer, ApiState};
use compgather::config::AppConfig;
use compgather::geocoder::Geocoder;
use compgather::matcher::VenueMatcher;
use compgather::parsers::ParserContext;
use compgather::scanner::{self, Scanner};
use compgather::scheduler::Scheduler;
use compgather::store::{self, settings::HOME_POSTCODE_KEY, Db};
use compgather::util::env as env_util;
use compgather::util::http::HttpClient;

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    let config = AppConfig::from_env();

    compgather::logging::init_tracing(&format!("{},sqlx=warn", config.log_level))?;
    info!("starting compgather");

    // --- DB connect + startup housekeeping ----------------------------------
    let database_url = env_util::db_url()?;
    let max_conns: u32 = env_util::env_parse("DB_MAX_CONNS", 10);
    let db = Db::connect(&database_url, max_conns)
        .await
        .context("database connection failed")?;

    scanner::seed_all(&db).await.context("seeding failed")?;
    store::scans::fail_stale_scans(&db).await?;

    // --- shared services ----------------------------------------------------
    let http = HttpClient::from_env()?;
    let geocoder = Arc::new(Geocoder::new(
        http.clone(),
        config.geocoder_primary_url.clone(),
        config.geocoder_fallback_url.clone(),
    ));

    // A home postcode set through the API outlives restarts.
    let home_postcode = store::settings::get_setting(&db, HOME_POSTCODE_KEY)
        .await?
        .unwrap_or_else(|| config.home_postcode.clone());
    if !geocoder.set_home_postcode(&home_postcode).await {
        warn!(postcode = %home_postcode, "home postcode not geocoded; distances unavailable");
    }

    let matcher = Arc::new(VenueMatcher::new(db.clone()));
    let parser_ctx = ParserContext {
        http,
        extractor_url: config.generic_extractor_url.clone(),
        extractor_model: config.generic_extractor_model.clone(),
    };
    let scanner = Arc::new(Scanner::new(
        db.clone(),
        matcher,
        Arc::clone(&geocoder),
        parser_ctx,
        Duration::from_secs(config.scan_timeout_seconds),
    ));
    let scheduler = Arc::new(Scheduler::new(
        db.clone(),
        scanner,
        config.schedule_hm(),
        config.scan_concurrency,
    ));

    // --- daily tick + shutdown propagation ----------------------------------
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let daily = tokio::spawn(Arc::clone(&scheduler).run_daily_loop(shutdown_rx));

    // --- API server (blocks until SIGINT) -----------------------------------
    let state = ApiState {
        db,
        scheduler,
        geocoder,
    };
    ApiServer::from_env()?.run(state).await?;

    info!("API server stopped; shutting down scheduler");
    let _ = shutdown_tx.send(true);
    let _ = daily.await;
    info!("shutdown complete");
    Ok(())
}
