use crate::config::{FusionConfig, SingleChannelPolicy};

/// Deterministically fuse per-channel risk probabilities into one 0-100
/// score. Monotonic non-decreasing in each channel's risk.
///
/// Under the default `redistribute` policy a single-channel transaction is
/// scored as `100 * risk_present` instead of being diluted by an absent
/// channel counting as zero. The `fixed` policy keeps the configured
/// weights as-is for callers that want the diluting behavior.
pub fn fuse(fiat: Option<f64>, crypto: Option<f64>, config: &FusionConfig) -> u8 {
    let combined = match (fiat, crypto) {
        (Some(f), Some(c)) => config.fiat_weight * f + config.crypto_weight * c,
        (Some(f), None) => single_channel(f, config.fiat_weight, config.single_channel),
        (None, Some(c)) => single_channel(c, config.crypto_weight, config.single_channel),
        (None, None) => 0.0,
    };
    (100.0 * combined.clamp(0.0, 1.0)).round() as u8
}

fn single_channel(risk: f64, weight: f64, policy: SingleChannelPolicy) -> f64 {
    match policy {
        SingleChannelPolicy::Redistribute => risk,
        SingleChannelPolicy::Fixed => weight * risk,
    }
}

/// Qualitative band for a fused score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=29 => Self::Low,
            30..=69 => Self::Medium,
            70..=89 => Self::High,
            _ => Self::Critical,
        }
    }
}
