use crate::config::FiatScoringConfig;
use crate::model::{FeatureVector, GeoFeature, ModelState};
use crate::types::FiatDetails;
use crate::watchlist::AmlWatchlist;

use super::signals::{ChannelRisk, Signal};

/// Score the fiat side of a transaction against the fitted anomaly model.
///
/// The model probability covers the amount/geo/currency feature vector;
/// grey-listed countries add a rule-based bump on top. Geo mismatch is
/// always surfaced as a signal when both countries are known, whether or
/// not the model crosses its alert threshold.
pub fn score(
    details: &FiatDetails,
    model: &ModelState,
    watchlist: &AmlWatchlist,
    config: &FiatScoringConfig,
) -> ChannelRisk {
    let geo = geo_feature(details);
    let features = FeatureVector {
        amount_z: model.amount_z(details.amount),
        geo,
        currency_weight: model.currency_weight(&details.currency),
    };
    let model_probability = model.probability(model.raw_score(&features));

    let mut signals = Vec::new();
    if geo == GeoFeature::Mismatch {
        signals.push(Signal::GeoMismatch {
            geo: details.geo_country.clone().unwrap_or_default(),
            card: details.card_country.clone(),
        });
    }
    if model_probability > config.alert_threshold {
        signals.push(Signal::AnomalousAmount {
            amount: details.amount,
            currency: details.currency.clone(),
        });
    }

    let grey_hits = grey_listed_countries(details, watchlist);
    for country in &grey_hits {
        signals.push(Signal::GreyListCountry {
            country: country.clone(),
        });
    }

    let probability = model_probability + config.grey_list_bump * grey_hits.len() as f64;

    tracing::debug!(
        model_probability,
        probability,
        signals = signals.len(),
        "Fiat channel scored"
    );
    ChannelRisk::new(probability, signals)
}

fn geo_feature(details: &FiatDetails) -> GeoFeature {
    match &details.geo_country {
        None => GeoFeature::Unknown,
        Some(geo) if geo.eq_ignore_ascii_case(&details.card_country) => GeoFeature::Match,
        Some(_) => GeoFeature::Mismatch,
    }
}

/// Distinct grey-listed countries among the card and geo countries.
fn grey_listed_countries(details: &FiatDetails, watchlist: &AmlWatchlist) -> Vec<String> {
    let mut hits = Vec::new();
    if watchlist.contains_jurisdiction(&details.card_country) {
        hits.push(details.card_country.to_ascii_uppercase());
    }
    if let Some(geo) = &details.geo_country {
        let geo = geo.to_ascii_uppercase();
        if watchlist.contains_jurisdiction(&geo) && !hits.contains(&geo) {
            hits.push(geo);
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_records;

    fn config() -> FiatScoringConfig {
        toml::from_str(r#"training_data_path = "unused.csv""#).unwrap()
    }

    fn model() -> ModelState {
        ModelState::fit(&test_records(), &config()).unwrap()
    }

    fn watchlist() -> AmlWatchlist {
        AmlWatchlist::for_tests(&[], &["NG", "IR"])
    }

    fn details(amount: f64, card: &str, geo: Option<&str>) -> FiatDetails {
        FiatDetails {
            amount,
            currency: "USD".to_string(),
            card_country: card.to_string(),
            geo_country: geo.map(String::from),
        }
    }

    #[test]
    fn test_geo_mismatch_always_signalled() {
        let risk = score(
            &details(100.0, "US", Some("DE")),
            &model(),
            &watchlist(),
            &config(),
        );
        // Ordinary amount, but the mismatch signal still fires.
        assert!(risk.signals.contains(&Signal::GeoMismatch {
            geo: "DE".to_string(),
            card: "US".to_string(),
        }));
    }

    #[test]
    fn test_unknown_geo_is_not_a_mismatch() {
        let risk = score(
            &details(100.0, "US", None),
            &model(),
            &watchlist(),
            &config(),
        );
        assert!(!risk
            .signals
            .iter()
            .any(|s| matches!(s, Signal::GeoMismatch { .. })));
    }

    #[test]
    fn test_matching_geo_no_signal_low_risk() {
        let risk = score(
            &details(100.0, "US", Some("us")),
            &model(),
            &watchlist(),
            &config(),
        );
        assert!(risk.signals.is_empty());
        assert!(risk.probability < 0.2);
    }

    #[test]
    fn test_anomalous_amount_flagged() {
        let risk = score(
            &details(2_000_000.0, "US", Some("NG")),
            &model(),
            &watchlist(),
            &config(),
        );
        assert!(risk
            .signals
            .iter()
            .any(|s| matches!(s, Signal::AnomalousAmount { .. })));
        assert!(risk.probability > 0.7);
    }

    #[test]
    fn test_grey_listed_country_bumps_risk() {
        let cfg = config();
        let plain = score(&details(100.0, "US", None), &model(), &watchlist(), &cfg);
        let listed = score(&details(100.0, "NG", None), &model(), &watchlist(), &cfg);
        assert!(listed.signals.contains(&Signal::GreyListCountry {
            country: "NG".to_string(),
        }));
        assert!(listed.probability >= plain.probability + cfg.grey_list_bump - 1e-9);
    }

    #[test]
    fn test_same_grey_country_counted_once() {
        let risk = score(
            &details(100.0, "NG", Some("NG")),
            &model(),
            &watchlist(),
            &config(),
        );
        let grey_count = risk
            .signals
            .iter()
            .filter(|s| matches!(s, Signal::GreyListCountry { .. }))
            .count();
        assert_eq!(grey_count, 1);
    }

    #[test]
    fn test_probability_in_unit_interval() {
        let risk = score(
            &details(10_000_000.0, "NG", Some("IR")),
            &model(),
            &watchlist(),
            &config(),
        );
        assert!((0.0..=1.0).contains(&risk.probability));
    }
}
