use std::collections::HashSet;

use super::signals::Signal;

/// Render structured signals into ordered, distinct alert strings.
///
/// Fiat signals come before crypto signals, each group in the canonical
/// evaluation order, so the output is stable no matter how the signals were
/// collected. Duplicates keep their first occurrence.
pub fn render(fiat_signals: &[Signal], crypto_signals: &[Signal]) -> Vec<String> {
    let mut fiat: Vec<&Signal> = fiat_signals.iter().collect();
    fiat.sort_by_key(|s| s.rank());
    let mut crypto: Vec<&Signal> = crypto_signals.iter().collect();
    crypto.sort_by_key(|s| s.rank());

    let mut seen = HashSet::new();
    let mut alerts = Vec::new();
    for signal in fiat.into_iter().chain(crypto) {
        let text = template(signal);
        if seen.insert(text.clone()) {
            alerts.push(text);
        }
    }
    alerts
}

/// One canonical template per signal.
pub fn template(signal: &Signal) -> String {
    match signal {
        Signal::GeoMismatch { geo, card } => format!("Geo mismatch: {} vs {}", geo, card),
        Signal::AnomalousAmount { amount, currency } => {
            format!("Anomalous amount: {} {}", amount, currency)
        }
        Signal::GreyListCountry { country } => format!("Grey-listed country: {}", country),
        Signal::MixerExposure { pct } => format!("Crypto: {}% from mixer", pct),
        Signal::DarknetExposure { pct } => format!("Crypto: {}% from darknet", pct),
        Signal::SanctionedExposure { pct } => {
            format!("Crypto: {}% from sanctioned entities", pct)
        }
        Signal::AmlListed => "AML list match".to_string(),
        Signal::YoungAddress { days } => format!("Address age under {} days", days),
        Signal::InsufficientData => "Crypto risk: insufficient data".to_string(),
        Signal::PartialAnalysis => "Partial analysis".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo() -> Signal {
        Signal::GeoMismatch {
            geo: "NG".to_string(),
            card: "US".to_string(),
        }
    }

    #[test]
    fn test_templates() {
        assert_eq!(template(&geo()), "Geo mismatch: NG vs US");
        assert_eq!(
            template(&Signal::MixerExposure { pct: 20 }),
            "Crypto: 20% from mixer"
        );
        assert_eq!(
            template(&Signal::SanctionedExposure { pct: 15 }),
            "Crypto: 15% from sanctioned entities"
        );
        assert_eq!(template(&Signal::AmlListed), "AML list match");
        assert_eq!(
            template(&Signal::InsufficientData),
            "Crypto risk: insufficient data"
        );
        assert_eq!(template(&Signal::PartialAnalysis), "Partial analysis");
    }

    #[test]
    fn test_fiat_before_crypto() {
        let alerts = render(&[geo()], &[Signal::MixerExposure { pct: 20 }]);
        assert_eq!(
            alerts,
            vec!["Geo mismatch: NG vs US", "Crypto: 20% from mixer"]
        );
    }

    #[test]
    fn test_order_independent_of_collection_order() {
        let shuffled = vec![
            Signal::AmlListed,
            Signal::InsufficientData,
            Signal::MixerExposure { pct: 42 },
        ];
        let ordered = vec![
            Signal::MixerExposure { pct: 42 },
            Signal::AmlListed,
            Signal::InsufficientData,
        ];
        assert_eq!(render(&[], &shuffled), render(&[], &ordered));
    }

    #[test]
    fn test_duplicates_collapsed() {
        let alerts = render(
            &[geo(), geo()],
            &[Signal::AmlListed, Signal::AmlListed],
        );
        assert_eq!(alerts.len(), 2);
    }

    #[test]
    fn test_empty_signals_render_empty() {
        assert!(render(&[], &[]).is_empty());
    }
}
