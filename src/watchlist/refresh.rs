use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::model::{training, ModelState};

use super::AmlWatchlist;

/// Background task that periodically refits the anomaly model from the
/// training CSV and reloads the AML watchlist, swapping each snapshot
/// atomically. A failed refresh keeps the previous snapshot.
pub fn spawn_refresher(
    config: Arc<Config>,
    model: Arc<ArcSwap<ModelState>>,
    watchlist: Arc<ArcSwap<AmlWatchlist>>,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut model_tick =
            tokio::time::interval(Duration::from_secs(config.fiat.refresh_secs.max(1)));
        let mut watchlist_tick =
            tokio::time::interval(Duration::from_secs(config.watchlist.refresh_secs.max(1)));
        // First tick fires immediately; skip it, startup already loaded both.
        model_tick.tick().await;
        watchlist_tick.tick().await;

        loop {
            tokio::select! {
                _ = model_tick.tick() => {
                    refresh_model(&config, &model);
                }
                _ = watchlist_tick.tick() => {
                    refresh_watchlist(&config, &watchlist);
                }
                _ = shutdown.cancelled() => {
                    tracing::info!("Refresher stopping");
                    break;
                }
            }
        }
    })
}

fn refresh_model(config: &Config, model: &ArcSwap<ModelState>) {
    let result = training::load_training_csv(&config.fiat.training_data_path)
        .and_then(|records| ModelState::fit(&records, &config.fiat));
    match result {
        Ok(fitted) => {
            let previous = model.load().version.clone();
            if fitted.version != previous {
                tracing::info!(from = %previous, to = %fitted.version, "Model snapshot swapped");
            }
            model.store(Arc::new(fitted));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Model refresh failed, keeping previous snapshot");
        }
    }
}

fn refresh_watchlist(config: &Config, watchlist: &ArcSwap<AmlWatchlist>) {
    match AmlWatchlist::load(&config.watchlist) {
        Ok(loaded) => {
            watchlist.store(Arc::new(loaded));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Watchlist refresh failed, keeping previous snapshot");
        }
    }
}
