pub mod client;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::RiskError;

/// On-chain analytics for an address, supplied by the external provider.
/// Inflow volumes are computed over the provider's bounded recent window.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainAnalytics {
    pub address: String,
    pub total_inflow: f64,
    #[serde(default)]
    pub mixer_inflow: f64,
    #[serde(default)]
    pub darknet_inflow: f64,
    #[serde(default)]
    pub sanctioned_inflow: f64,
    /// When the address was first seen on-chain, if known.
    #[serde(default)]
    pub first_seen: Option<DateTime<Utc>>,
    /// Jurisdiction tag attributed to the address, if known.
    #[serde(default)]
    pub jurisdiction: Option<String>,
}

impl ChainAnalytics {
    /// Age of the address in whole days relative to `now`.
    pub fn age_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.first_seen.map(|seen| (now - seen).num_days())
    }
}

/// Source of chain analytics. The HTTP implementation lives in
/// [`client::HttpAnalyticsProvider`]; tests substitute stubs.
pub trait ChainAnalyticsProvider: Send + Sync {
    fn fetch(
        &self,
        address: &str,
    ) -> impl std::future::Future<Output = Result<ChainAnalytics, RiskError>> + Send;
}
