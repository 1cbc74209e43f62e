use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use paywatch_scorer::analytics::client::HttpAnalyticsProvider;
use paywatch_scorer::api::{self, AppState};
use paywatch_scorer::config::Config;
use paywatch_scorer::model::{training, ModelState};
use paywatch_scorer::scoring::pipeline::ScoringPipeline;
use paywatch_scorer::watchlist::{refresh, AmlWatchlist};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Initialize structured logging (set RUST_LOG=info for output)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    tracing::info!("PayWatch scorer starting");

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Arc::new(Config::load(&config_path)?);
    tracing::info!("Configuration loaded from {}", config_path);

    // Fit the anomaly model. The service refuses to start without one.
    let records = training::load_training_csv(&config.fiat.training_data_path)?;
    let model = ModelState::fit(&records, &config.fiat)?;
    tracing::info!(version = %model.version, "Anomaly model ready");

    // Load the AML watchlist
    let watchlist = AmlWatchlist::load(&config.watchlist)?;

    let model = Arc::new(ArcSwap::from_pointee(model));
    let watchlist = Arc::new(ArcSwap::from_pointee(watchlist));

    // Background refresher swaps both snapshots atomically on schedule
    let shutdown = CancellationToken::new();
    let refresher = refresh::spawn_refresher(
        config.clone(),
        model.clone(),
        watchlist.clone(),
        shutdown.clone(),
    );

    let provider = HttpAnalyticsProvider::new(&config.analytics)?;
    let pipeline = ScoringPipeline::new(config.clone(), provider, model, watchlist);
    let state = Arc::new(AppState { pipeline });

    // Serve the API until Ctrl+C
    if config.api.enabled {
        let host = config.api.host.clone();
        let port = config.api.port;
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = api::serve(state, &host, port).await {
                tracing::error!(error = %e, "API server failed");
            }
        });
    }

    tracing::info!("Scoring service started. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    shutdown.cancel();
    let _ = refresher.await;

    tracing::info!("PayWatch scorer stopped gracefully");
    Ok(())
}
