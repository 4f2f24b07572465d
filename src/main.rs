use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sunnalytics::api::health::HealthState;
use sunnalytics::api::latency::LatencyStats;
use sunnalytics::api::{router, ApiState};
use sunnalytics::client::ApiClient;
use sunnalytics::config::{storage_keys, Config};
use sunnalytics::db::KvStore;
use sunnalytics::error::Result;
use sunnalytics::filter::PresetCatalog;
use sunnalytics::poller::TokenPoller;
use sunnalytics::scorer::PicksReporter;
use sunnalytics::state::TokenStore;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Local persistence ---
    let kv = KvStore::open(&cfg.db_path).await?;
    info!("Local store ready at {}", cfg.db_path);

    if kv.get_flag(storage_keys::WELCOME_SEEN).await? {
        info!("Welcome back");
    } else {
        info!(
            "First run: polling {} every {:?}; local API on port {}",
            cfg.api_base_url, cfg.poll_interval, cfg.api_port,
        );
        kv.set_flag(storage_keys::WELCOME_SEEN, true).await?;
    }

    // --- Token store, restored from the last session ---
    let store = TokenStore::new();
    let restored = store.restore(&kv).await?;
    if restored == 0 {
        info!("No cached tokens; waiting for first poll");
    }

    let presets = Arc::new(PresetCatalog::load(kv.clone()).await?);

    if cfg.allowed_exchanges.is_empty() {
        warn!("ALLOWED_EXCHANGES is empty: AI picks consider tokens from every exchange");
    } else {
        info!("AI picks restricted to exchanges: {}", cfg.allowed_exchanges.join(", "));
    }

    // --- Spawn tasks ---
    let client = ApiClient::new(&cfg)?;
    let latency = Arc::new(LatencyStats::new()?);
    let health = Arc::new(HealthState::new());

    // Token poller (background, first poll immediately)
    let poller = TokenPoller::new(
        &cfg,
        client.clone(),
        Arc::clone(&store),
        kv.clone(),
        Arc::clone(&latency),
        Arc::clone(&health),
    );
    tokio::spawn(Arc::clone(&poller).run());

    // AI picks reporter (wakes on every new token list)
    let reporter = PicksReporter::new(Arc::clone(&store), cfg.allowed_exchanges.clone());
    tokio::spawn(async move { reporter.run().await });

    // HTTP API server
    let api_state = ApiState {
        store,
        presets,
        client,
        poller,
        kv,
        latency,
        health,
        allowed_exchanges: Arc::new(cfg.allowed_exchanges.clone()),
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
