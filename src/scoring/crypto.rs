use chrono::{DateTime, Utc};

use crate::analytics::ChainAnalytics;
use crate::config::CryptoScoringConfig;
use crate::types::CryptoDetails;
use crate::watchlist::AmlWatchlist;

use super::signals::{ChannelRisk, Signal};

/// Evaluate the crypto side of a transaction from its chain analytics.
///
/// When analytics are unavailable the channel degrades to the configured
/// default risk with an insufficient-data signal; the local AML address
/// check still applies since it needs no analytics.
pub fn score(
    details: &CryptoDetails,
    analytics: Option<&ChainAnalytics>,
    watchlist: &AmlWatchlist,
    config: &CryptoScoringConfig,
    now: DateTime<Utc>,
) -> ChannelRisk {
    let mut signals = Vec::new();

    let Some(analytics) = analytics else {
        let mut risk = config.insufficient_data_risk;
        if watchlist.contains_address(&details.address) {
            signals.push(Signal::AmlListed);
            risk += config.aml_bump;
        }
        signals.push(Signal::InsufficientData);
        return ChannelRisk::new(risk, signals);
    };

    let mixer_ratio = inflow_ratio(analytics.mixer_inflow, analytics.total_inflow);
    let darknet_ratio = inflow_ratio(analytics.darknet_inflow, analytics.total_inflow);
    let sanctioned_ratio = inflow_ratio(analytics.sanctioned_inflow, analytics.total_inflow);

    let mixer_triggered = check_exposure(mixer_ratio, config.mixer_threshold);
    if let Some(pct) = mixer_triggered {
        signals.push(Signal::MixerExposure { pct });
    }
    if let Some(pct) = check_exposure(darknet_ratio, config.darknet_threshold) {
        signals.push(Signal::DarknetExposure { pct });
    }
    if let Some(pct) = check_exposure(sanctioned_ratio, config.sanctioned_threshold) {
        signals.push(Signal::SanctionedExposure { pct });
    }

    let aml_listed = watchlist.contains_address(&details.address)
        || analytics
            .jurisdiction
            .as_deref()
            .is_some_and(|j| watchlist.contains_jurisdiction(j));
    if aml_listed {
        signals.push(Signal::AmlListed);
    }

    let young = analytics
        .age_days(now)
        .is_some_and(|age| age < config.young_address_days);
    if young {
        signals.push(Signal::YoungAddress {
            days: config.young_address_days,
        });
    }

    let weighted = config.mixer_weight * mixer_ratio
        + config.darknet_weight * darknet_ratio
        + config.sanctioned_weight * sanctioned_ratio;
    // Crossing the mixer threshold is a hard escalation, not merely additive.
    let base = if mixer_triggered.is_some() {
        weighted.max(config.mixer_floor)
    } else {
        weighted
    };
    let risk = base
        + if aml_listed { config.aml_bump } else { 0.0 }
        + if young { config.young_address_bump } else { 0.0 };

    tracing::debug!(
        mixer_ratio,
        darknet_ratio,
        sanctioned_ratio,
        aml_listed,
        risk,
        "Crypto channel scored"
    );
    ChannelRisk::new(risk, signals)
}

/// Tagged-inflow ratio. Zero total inflow means no exposure, not an error.
fn inflow_ratio(tagged: f64, total: f64) -> f64 {
    if total <= 0.0 {
        0.0
    } else {
        (tagged / total).clamp(0.0, 1.0)
    }
}

/// Exposure percentage when the ratio crosses its threshold.
fn check_exposure(ratio: f64, threshold: f64) -> Option<u32> {
    if ratio > threshold {
        Some((ratio * 100.0).round() as u32)
    } else {
        None
    }
}
