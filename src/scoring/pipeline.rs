use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::Utc;

use crate::analytics::ChainAnalyticsProvider;
use crate::config::Config;
use crate::error::RiskError;
use crate::model::ModelState;
use crate::types::{RiskAssessment, Transaction};
use crate::watchlist::AmlWatchlist;

use super::signals::Signal;
use super::{alerts, crypto, fiat, fusion};

/// Orchestrates per-request scoring: validation, the per-channel scorers,
/// fusion, and alert rendering, under the configured deadline.
///
/// Holds only shared read-only snapshots; every request loads one
/// consistent model and watchlist snapshot and keeps it for the request's
/// lifetime, so concurrent reloads never produce a torn read.
pub struct ScoringPipeline<P> {
    config: Arc<Config>,
    provider: P,
    model: Arc<ArcSwap<ModelState>>,
    watchlist: Arc<ArcSwap<AmlWatchlist>>,
}

impl<P: ChainAnalyticsProvider> ScoringPipeline<P> {
    pub fn new(
        config: Arc<Config>,
        provider: P,
        model: Arc<ArcSwap<ModelState>>,
        watchlist: Arc<ArcSwap<AmlWatchlist>>,
    ) -> Self {
        Self {
            config,
            provider,
            model,
            watchlist,
        }
    }

    pub fn model_snapshot(&self) -> Arc<ModelState> {
        self.model.load_full()
    }

    pub fn watchlist_snapshot(&self) -> Arc<AmlWatchlist> {
        self.watchlist.load_full()
    }

    /// Score one transaction. Validation errors surface to the caller;
    /// analytics failures degrade the crypto channel instead of failing.
    pub async fn assess(&self, transaction: &Transaction) -> Result<RiskAssessment, RiskError> {
        transaction.validate()?;

        let model = self.model.load_full();
        let watchlist = self.watchlist.load_full();
        let now = Utc::now();

        let fiat_risk = transaction
            .fiat()
            .map(|details| fiat::score(details, &model, &watchlist, &self.config.fiat));

        let mut degraded = false;
        let crypto_risk = match transaction.crypto() {
            Some(details) => {
                let deadline = Duration::from_millis(self.config.pipeline.deadline_ms);
                let analytics =
                    match tokio::time::timeout(deadline, self.provider.fetch(&details.address))
                        .await
                    {
                        Ok(Ok(analytics)) => Some(analytics),
                        Ok(Err(e)) => {
                            tracing::warn!(
                                address = %details.address,
                                error = %e,
                                "Chain analytics unavailable, degrading crypto channel"
                            );
                            degraded = true;
                            None
                        }
                        Err(_) => {
                            tracing::warn!(
                                address = %details.address,
                                deadline_ms = self.config.pipeline.deadline_ms,
                                "Chain analytics exceeded deadline, degrading crypto channel"
                            );
                            degraded = true;
                            None
                        }
                    };
                Some(crypto::score(
                    details,
                    analytics.as_ref(),
                    &watchlist,
                    &self.config.crypto,
                    now,
                ))
            }
            None => None,
        };

        let fiat_signals = fiat_risk
            .as_ref()
            .map(|r| r.signals.clone())
            .unwrap_or_default();
        let mut crypto_signals = crypto_risk
            .as_ref()
            .map(|r| r.signals.clone())
            .unwrap_or_default();
        // The client timeout fires before the outer deadline, so both
        // degradation paths mark the assessment as partial.
        if degraded {
            crypto_signals.push(Signal::PartialAnalysis);
        }

        let total_risk = fusion::fuse(
            fiat_risk.as_ref().map(|r| r.probability),
            crypto_risk.as_ref().map(|r| r.probability),
            &self.config.fusion,
        );
        let alerts = alerts::render(&fiat_signals, &crypto_signals);

        tracing::info!(
            total_risk,
            alerts = alerts.len(),
            model_version = %model.version,
            "Transaction assessed"
        );
        Ok(RiskAssessment {
            total_risk,
            alerts,
            fiat_risk: fiat_risk.map(|r| subscore(r.probability)),
            crypto_risk: crypto_risk.map(|r| subscore(r.probability)),
        })
    }
}

/// Channel probability on the 0-100 scale, two decimals.
fn subscore(probability: f64) -> f64 {
    (probability * 10_000.0).round() / 100.0
}
