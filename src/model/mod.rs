pub mod training;

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::config::FiatScoringConfig;
use crate::error::RiskError;
use crate::model::training::TrainingRecord;

/// Geo feature value. Unknown is its own state, never coerced to a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoFeature {
    Match,
    Mismatch,
    Unknown,
}

/// Feature vector fed to the fitted anomaly model.
#[derive(Debug, Clone, Copy)]
pub struct FeatureVector {
    /// z-scaled ln(1 + amount).
    pub amount_z: f64,
    pub geo: GeoFeature,
    /// Configured per-currency risk weight (0 for unlisted currencies).
    pub currency_weight: f64,
}

/// Immutable fitted snapshot of the fiat anomaly model.
///
/// Holds the feature statistics and decision threshold fitted on historical
/// data, plus the feature weights frozen from the configuration at fit time.
/// Shared by reference across concurrent requests and replaced atomically
/// on refresh.
#[derive(Debug, Clone)]
pub struct ModelState {
    pub version: String,
    pub fitted_at: DateTime<Utc>,
    pub training_rows: usize,
    log_amount_mean: f64,
    log_amount_std: f64,
    /// Raw scores at or below this map near 0; scores beyond it climb to 1.
    threshold: f64,
    /// Scale of the ramp beyond the threshold.
    saturation: f64,
    amount_weight: f64,
    geo_mismatch_weight: f64,
    geo_unknown_weight: f64,
    currency_weights: HashMap<String, f64>,
}

impl ModelState {
    /// Fit the model on historical fiat transactions.
    ///
    /// The decision threshold is the (1 - contamination) quantile of the
    /// training raw scores, so roughly `contamination` of the training set
    /// scores above it.
    pub fn fit(records: &[TrainingRecord], config: &FiatScoringConfig) -> Result<Self, RiskError> {
        if records.len() < 10 {
            return Err(RiskError::Configuration(format!(
                "anomaly model needs at least 10 training rows, got {}",
                records.len()
            )));
        }

        let log_amounts: Vec<f64> = records.iter().map(|r| (1.0 + r.amount).ln()).collect();
        let mean = log_amounts.iter().sum::<f64>() / log_amounts.len() as f64;
        let variance = log_amounts
            .iter()
            .map(|x| (x - mean) * (x - mean))
            .sum::<f64>()
            / log_amounts.len() as f64;
        let std = variance.sqrt().max(1e-6);

        let mut partial = Self {
            version: String::new(),
            fitted_at: Utc::now(),
            training_rows: records.len(),
            log_amount_mean: mean,
            log_amount_std: std,
            threshold: 0.0,
            saturation: 1.0,
            amount_weight: config.amount_weight,
            geo_mismatch_weight: config.geo_mismatch_weight,
            geo_unknown_weight: config.geo_unknown_weight,
            currency_weights: config.currency_weights.clone(),
        };

        let mut raw_scores: Vec<f64> = records
            .iter()
            .map(|r| partial.raw_score(&partial.features_for(r)))
            .collect();
        raw_scores.sort_by(|a, b| a.total_cmp(b));

        partial.threshold = quantile(&raw_scores, 1.0 - config.contamination);
        let spread = quantile(&raw_scores, 0.999) - partial.threshold;
        partial.saturation = spread.max(0.25);

        // Version derived from the fit so identical data yields an
        // identical model snapshot.
        partial.version = format!(
            "v{}-{:.4}-{:.4}",
            records.len(),
            partial.log_amount_mean,
            partial.threshold
        );

        tracing::info!(
            rows = records.len(),
            version = %partial.version,
            threshold = partial.threshold,
            "Fitted fiat anomaly model"
        );
        Ok(partial)
    }

    fn features_for(&self, record: &TrainingRecord) -> FeatureVector {
        let geo = match &record.geo_country {
            None => GeoFeature::Unknown,
            Some(geo) if geo.eq_ignore_ascii_case(&record.card_country) => GeoFeature::Match,
            Some(_) => GeoFeature::Mismatch,
        };
        FeatureVector {
            amount_z: self.amount_z(record.amount),
            geo,
            currency_weight: self.currency_weight(&record.currency),
        }
    }

    pub fn amount_z(&self, amount: f64) -> f64 {
        ((1.0 + amount).ln() - self.log_amount_mean) / self.log_amount_std
    }

    pub fn currency_weight(&self, currency: &str) -> f64 {
        self.currency_weights
            .get(&currency.to_ascii_uppercase())
            .copied()
            .unwrap_or(0.0)
    }

    /// Raw anomaly score: weighted distance of the feature vector from the
    /// fitted normal. Higher is more anomalous.
    pub fn raw_score(&self, features: &FeatureVector) -> f64 {
        let geo_term = match features.geo {
            GeoFeature::Match => 0.0,
            GeoFeature::Mismatch => self.geo_mismatch_weight,
            GeoFeature::Unknown => self.geo_unknown_weight,
        };
        self.amount_weight * features.amount_z.abs() + geo_term + features.currency_weight
    }

    /// Map a raw score to an anomaly probability in [0, 1].
    ///
    /// Monotonic and deterministic for a fixed snapshot: exactly 0 at or
    /// below the fitted threshold, saturating toward 1 beyond it.
    pub fn probability(&self, raw: f64) -> f64 {
        let excess = raw - self.threshold;
        if excess <= 0.0 {
            0.0
        } else {
            1.0 - (-excess / self.saturation).exp()
        }
    }
}

/// Quantile of an already-sorted slice, nearest-rank with interpolation.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

#[cfg(test)]
pub(crate) fn test_records() -> Vec<TrainingRecord> {
    // Mostly ordinary domestic USD activity with a few outliers.
    let mut records = Vec::new();
    for i in 0..95 {
        records.push(TrainingRecord {
            amount: 40.0 + (i as f64 % 20.0) * 12.5,
            currency: "USD".to_string(),
            card_country: "US".to_string(),
            geo_country: Some("US".to_string()),
        });
    }
    for amount in [18_000.0, 25_000.0, 40_000.0, 55_000.0, 90_000.0] {
        records.push(TrainingRecord {
            amount,
            currency: "USD".to_string(),
            card_country: "US".to_string(),
            geo_country: Some("NG".to_string()),
        });
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FiatScoringConfig;

    fn config() -> FiatScoringConfig {
        toml::from_str(r#"training_data_path = "unused.csv""#).unwrap()
    }

    fn fitted() -> ModelState {
        ModelState::fit(&test_records(), &config()).unwrap()
    }

    #[test]
    fn test_fit_rejects_tiny_dataset() {
        let records = test_records().into_iter().take(5).collect::<Vec<_>>();
        assert!(ModelState::fit(&records, &config()).is_err());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let a = fitted();
        let b = fitted();
        assert_eq!(a.version, b.version);
        assert_eq!(a.threshold, b.threshold);
        assert_eq!(a.log_amount_mean, b.log_amount_mean);
    }

    #[test]
    fn test_probability_zero_at_or_below_threshold() {
        let model = fitted();
        assert_eq!(model.probability(model.threshold), 0.0);
        assert_eq!(model.probability(model.threshold - 1.0), 0.0);
    }

    #[test]
    fn test_probability_monotonic_and_saturating() {
        let model = fitted();
        let mut last = 0.0;
        for step in 0..50 {
            let raw = model.threshold + step as f64 * 0.2;
            let p = model.probability(raw);
            assert!(p >= last, "probability must be non-decreasing");
            assert!((0.0..=1.0).contains(&p));
            last = p;
        }
        assert!(model.probability(model.threshold + 20.0) > 0.99);
    }

    #[test]
    fn test_inliers_score_low_outliers_score_high() {
        let model = fitted();
        let inlier = FeatureVector {
            amount_z: model.amount_z(100.0),
            geo: GeoFeature::Match,
            currency_weight: 0.0,
        };
        let outlier = FeatureVector {
            amount_z: model.amount_z(500_000.0),
            geo: GeoFeature::Mismatch,
            currency_weight: 0.0,
        };
        let p_in = model.probability(model.raw_score(&inlier));
        let p_out = model.probability(model.raw_score(&outlier));
        assert!(p_in < 0.2, "inlier scored {}", p_in);
        assert!(p_out > 0.5, "outlier scored {}", p_out);
    }

    #[test]
    fn test_unknown_geo_scores_between_match_and_mismatch() {
        let model = fitted();
        let base = |geo| FeatureVector {
            amount_z: 1.0,
            geo,
            currency_weight: 0.0,
        };
        let matched = model.raw_score(&base(GeoFeature::Match));
        let unknown = model.raw_score(&base(GeoFeature::Unknown));
        let mismatch = model.raw_score(&base(GeoFeature::Mismatch));
        assert!(matched < unknown && unknown < mismatch);
    }

    #[test]
    fn test_quantile() {
        let sorted = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&sorted, 0.0), 1.0);
        assert_eq!(quantile(&sorted, 1.0), 5.0);
        assert_eq!(quantile(&sorted, 0.5), 3.0);
    }
}
