use serde::Deserialize;
use std::collections::HashMap;

use crate::error::RiskError;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub fusion: FusionConfig,
    pub fiat: FiatScoringConfig,
    #[serde(default)]
    pub crypto: CryptoScoringConfig,
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub watchlist: WatchlistConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

// ============================================================
// Fusion
// ============================================================

/// How a single-channel transaction is weighted.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SingleChannelPolicy {
    /// The absent channel's weight is redistributed to the present one.
    Redistribute,
    /// The configured weight applies as-is, diluting single-channel scores.
    Fixed,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FusionConfig {
    #[serde(default = "default_half")]
    pub fiat_weight: f64,
    #[serde(default = "default_half")]
    pub crypto_weight: f64,
    #[serde(default = "default_single_channel")]
    pub single_channel: SingleChannelPolicy,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            fiat_weight: 0.5,
            crypto_weight: 0.5,
            single_channel: SingleChannelPolicy::Redistribute,
        }
    }
}

fn default_half() -> f64 {
    0.5
}

fn default_single_channel() -> SingleChannelPolicy {
    SingleChannelPolicy::Redistribute
}

// ============================================================
// Fiat scoring
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct FiatScoringConfig {
    /// CSV of historical fiat transactions the anomaly model is fitted on.
    pub training_data_path: String,
    /// Expected proportion of outliers in the training data.
    #[serde(default = "default_contamination")]
    pub contamination: f64,
    #[serde(default = "default_amount_weight")]
    pub amount_weight: f64,
    #[serde(default = "default_geo_mismatch_weight")]
    pub geo_mismatch_weight: f64,
    #[serde(default = "default_geo_unknown_weight")]
    pub geo_unknown_weight: f64,
    /// Per-currency risk weights. Unlisted currencies default to 0.
    #[serde(default)]
    pub currency_weights: HashMap<String, f64>,
    /// Additive bump when the card or geo country is on the grey list.
    #[serde(default = "default_grey_list_bump")]
    pub grey_list_bump: f64,
    /// Model probability above which the anomalous-amount alert fires.
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,
    /// How often the model is refitted from the training CSV.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

fn default_contamination() -> f64 {
    0.05
}

fn default_amount_weight() -> f64 {
    1.0
}

fn default_geo_mismatch_weight() -> f64 {
    1.0
}

fn default_geo_unknown_weight() -> f64 {
    0.5
}

fn default_grey_list_bump() -> f64 {
    0.2
}

fn default_alert_threshold() -> f64 {
    0.7
}

fn default_refresh_secs() -> u64 {
    3600
}

// ============================================================
// Crypto scoring
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct CryptoScoringConfig {
    /// Mixer inflow ratio above which the hard escalation applies.
    #[serde(default = "default_taint_threshold")]
    pub mixer_threshold: f64,
    #[serde(default = "default_taint_threshold")]
    pub darknet_threshold: f64,
    #[serde(default = "default_taint_threshold")]
    pub sanctioned_threshold: f64,
    /// Minimum risk once mixer exposure crosses the threshold.
    #[serde(default = "default_mixer_floor")]
    pub mixer_floor: f64,
    #[serde(default = "default_half")]
    pub mixer_weight: f64,
    #[serde(default = "default_half")]
    pub darknet_weight: f64,
    /// Sanctioned inflow is the gravest category and counts at full weight.
    #[serde(default = "default_sanctioned_weight")]
    pub sanctioned_weight: f64,
    /// Fixed bump when the address or its jurisdiction is AML-listed.
    #[serde(default = "default_aml_bump")]
    pub aml_bump: f64,
    /// Risk assigned when chain analytics are unavailable.
    #[serde(default = "default_insufficient_data_risk")]
    pub insufficient_data_risk: f64,
    /// Addresses younger than this many days raise a signal.
    #[serde(default = "default_young_address_days")]
    pub young_address_days: i64,
    #[serde(default = "default_young_address_bump")]
    pub young_address_bump: f64,
}

impl Default for CryptoScoringConfig {
    fn default() -> Self {
        Self {
            mixer_threshold: 0.10,
            darknet_threshold: 0.10,
            sanctioned_threshold: 0.10,
            mixer_floor: 0.7,
            mixer_weight: 0.5,
            darknet_weight: 0.5,
            sanctioned_weight: 1.0,
            aml_bump: 0.2,
            insufficient_data_risk: 0.5,
            young_address_days: 7,
            young_address_bump: 0.1,
        }
    }
}

fn default_taint_threshold() -> f64 {
    0.10
}

fn default_mixer_floor() -> f64 {
    0.7
}

fn default_sanctioned_weight() -> f64 {
    1.0
}

fn default_aml_bump() -> f64 {
    0.2
}

fn default_insufficient_data_risk() -> f64 {
    0.5
}

fn default_young_address_days() -> i64 {
    7
}

fn default_young_address_bump() -> f64 {
    0.1
}

// ============================================================
// Chain analytics provider
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Per-request timeout for the provider call.
    #[serde(default = "default_analytics_timeout_ms")]
    pub timeout_ms: u64,
    /// Inflow totals are requested over this bounded recent window.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

fn default_analytics_timeout_ms() -> u64 {
    500
}

fn default_window_days() -> u32 {
    365
}

// ============================================================
// AML watchlist
// ============================================================

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WatchlistConfig {
    /// CSV of flagged addresses. Optional; the list is empty without it.
    pub address_path: Option<String>,
    /// CSV of flagged jurisdictions. Optional; falls back to the built-in
    /// FATF grey/black lists.
    pub jurisdiction_path: Option<String>,
    #[serde(default = "default_watchlist_refresh_secs")]
    pub refresh_secs: u64,
}

fn default_watchlist_refresh_secs() -> u64 {
    3600
}

// ============================================================
// Pipeline
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Overall per-request scoring deadline.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { deadline_ms: 800 }
    }
}

fn default_deadline_ms() -> u64 {
    800
}

// ============================================================
// API
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_api_host")]
    pub host: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_port() -> u16 {
    3000
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

impl Config {
    pub fn load(path: &str) -> Result<Self, RiskError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RiskError::Configuration(format!("failed to read config file '{}': {}", path, e))
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            RiskError::Configuration(format!("failed to parse config file '{}': {}", path, e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RiskError> {
        let weight_sum = self.fusion.fiat_weight + self.fusion.crypto_weight;
        if (weight_sum - 1.0).abs() > 1e-9 {
            return Err(RiskError::Configuration(format!(
                "fusion weights must sum to 1.0, got {} + {} = {}",
                self.fusion.fiat_weight, self.fusion.crypto_weight, weight_sum
            )));
        }
        for (name, w) in [
            ("fusion.fiat_weight", self.fusion.fiat_weight),
            ("fusion.crypto_weight", self.fusion.crypto_weight),
            ("crypto.mixer_threshold", self.crypto.mixer_threshold),
            ("crypto.darknet_threshold", self.crypto.darknet_threshold),
            (
                "crypto.sanctioned_threshold",
                self.crypto.sanctioned_threshold,
            ),
            ("crypto.mixer_floor", self.crypto.mixer_floor),
            ("crypto.mixer_weight", self.crypto.mixer_weight),
            ("crypto.darknet_weight", self.crypto.darknet_weight),
            ("crypto.sanctioned_weight", self.crypto.sanctioned_weight),
            ("crypto.aml_bump", self.crypto.aml_bump),
            (
                "crypto.insufficient_data_risk",
                self.crypto.insufficient_data_risk,
            ),
            ("crypto.young_address_bump", self.crypto.young_address_bump),
            ("fiat.grey_list_bump", self.fiat.grey_list_bump),
            ("fiat.alert_threshold", self.fiat.alert_threshold),
        ] {
            if !(0.0..=1.0).contains(&w) {
                return Err(RiskError::Configuration(format!(
                    "{} must be in [0, 1], got {}",
                    name, w
                )));
            }
        }
        if !(self.fiat.contamination > 0.0 && self.fiat.contamination < 0.5) {
            return Err(RiskError::Configuration(format!(
                "fiat.contamination must be in (0, 0.5), got {}",
                self.fiat.contamination
            )));
        }
        if self.fiat.training_data_path.is_empty() {
            return Err(RiskError::Configuration(
                "fiat.training_data_path must be set".to_string(),
            ));
        }
        if self.pipeline.deadline_ms == 0 {
            return Err(RiskError::Configuration(
                "pipeline.deadline_ms must be positive".to_string(),
            ));
        }
        if self.analytics.timeout_ms == 0 {
            return Err(RiskError::Configuration(
                "analytics.timeout_ms must be positive".to_string(),
            ));
        }
        if self.analytics.timeout_ms > self.pipeline.deadline_ms {
            return Err(RiskError::Configuration(format!(
                "analytics.timeout_ms ({}) must not exceed pipeline.deadline_ms ({})",
                self.analytics.timeout_ms, self.pipeline.deadline_ms
            )));
        }
        if self.analytics.base_url.is_empty() {
            return Err(RiskError::Configuration(
                "analytics.base_url must be set".to_string(),
            ));
        }
        Ok(())
    }
}
