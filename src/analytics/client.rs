use std::time::Duration;

use reqwest::StatusCode;

use crate::config::AnalyticsConfig;
use crate::error::RiskError;

use super::{ChainAnalytics, ChainAnalyticsProvider};

/// HTTP client for the chain-analytics provider.
///
/// Every failure mode (timeout, rate limit, transport error, bad payload)
/// maps to [`RiskError::DependencyUnavailable`] so the pipeline can take
/// the degradation path instead of failing the request.
pub struct HttpAnalyticsProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    window_days: u32,
}

impl HttpAnalyticsProvider {
    pub fn new(config: &AnalyticsConfig) -> Result<Self, RiskError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                RiskError::Configuration(format!("failed to build analytics client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            window_days: config.window_days,
        })
    }
}

impl ChainAnalyticsProvider for HttpAnalyticsProvider {
    async fn fetch(&self, address: &str) -> Result<ChainAnalytics, RiskError> {
        let url = format!(
            "{}/v1/address/{}/analytics?window_days={}",
            self.base_url, address, self.window_days
        );

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RiskError::DependencyUnavailable("analytics request timed out".to_string())
            } else {
                RiskError::DependencyUnavailable(format!("analytics request failed: {}", e))
            }
        })?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(RiskError::DependencyUnavailable(
                "analytics provider rate limited".to_string(),
            ));
        }
        if !response.status().is_success() {
            return Err(RiskError::DependencyUnavailable(format!(
                "analytics provider returned {}",
                response.status()
            )));
        }

        let analytics: ChainAnalytics = response.json().await.map_err(|e| {
            RiskError::DependencyUnavailable(format!("bad analytics payload: {}", e))
        })?;

        tracing::debug!(
            address,
            total_inflow = analytics.total_inflow,
            mixer_inflow = analytics.mixer_inflow,
            "Fetched chain analytics"
        );
        Ok(analytics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AnalyticsConfig {
        toml::from_str(r#"base_url = "http://localhost:9000/""#).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let provider = HttpAnalyticsProvider::new(&config()).unwrap();
        assert_eq!(provider.base_url, "http://localhost:9000");
    }

    #[test]
    fn test_analytics_payload_defaults() {
        let analytics: ChainAnalytics = serde_json::from_str(
            r#"{"address": "0xabc", "total_inflow": 12.5}"#,
        )
        .unwrap();
        assert_eq!(analytics.mixer_inflow, 0.0);
        assert!(analytics.first_seen.is_none());
        assert!(analytics.jurisdiction.is_none());
    }
}
