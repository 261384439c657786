use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use oddsboard::api::health::HealthState;
use oddsboard::api::latency::LatencyStats;
use oddsboard::api::routes::{router, ApiState};
use oddsboard::config::Config;
use oddsboard::error::Result;
use oddsboard::fetcher::ApiClient;
use oddsboard::refresh::DataRefresher;
use oddsboard::state::SnapshotStore;

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
    let store = SnapshotStore::new();
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new()?);

    // --- Initial snapshot, then background refresh ---
    if cfg.use_mock_data {
        warn!("API_URL not set or USE_MOCK_DATA=true: serving bundled mock data");
        DataRefresher::mock(Arc::clone(&store), Arc::clone(&health))
            .refresh_once()
            .await;
    } else {
        let client = ApiClient::new(&cfg, Arc::clone(&latency))?;
        let refresher = DataRefresher::new(
            client,
            Arc::clone(&store),
            Arc::clone(&health),
            cfg.refresh_interval_secs,
        );
        // The first interval tick fires immediately.
        tokio::spawn(async move { refresher.run().await });
        info!(
            api_url = %cfg.api_url,
            every_secs = cfg.refresh_interval_secs,
            movers_hours = cfg.movers_hours,
            movers_threshold = cfg.movers_threshold,
            "Backend refresher started"
        );
    }

    // HTTP API server
    let api_state = ApiState { store, health, latency };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
