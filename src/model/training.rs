use std::io::Read;

use crate::error::RiskError;

/// One historical fiat transaction used to fit the anomaly model.
#[derive(Debug, Clone)]
pub struct TrainingRecord {
    pub amount: f64,
    pub currency: String,
    pub card_country: String,
    pub geo_country: Option<String>,
}

/// Load training records from a CSV file.
/// Expected columns: amount, currency, card_country, geo_country
/// (geo_country may be empty for transactions with no IP-derived country).
pub fn load_training_csv(path: &str) -> Result<Vec<TrainingRecord>, RiskError> {
    let file = std::fs::File::open(path).map_err(|e| {
        RiskError::Configuration(format!("failed to open training CSV '{}': {}", path, e))
    })?;
    let records = parse_training_csv(file)
        .map_err(|e| RiskError::Configuration(format!("training CSV '{}': {}", path, e)))?;
    tracing::info!(rows = records.len(), path, "Loaded training data");
    Ok(records)
}

pub fn parse_training_csv<R: Read>(reader: R) -> Result<Vec<TrainingRecord>, String> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        let amount: f64 = record
            .get(0)
            .unwrap_or("")
            .trim()
            .parse()
            .map_err(|e| format!("bad amount in row {}: {}", records.len() + 1, e))?;
        let currency = record.get(1).unwrap_or("").trim().to_string();
        let card_country = record.get(2).unwrap_or("").trim().to_string();
        let geo_raw = record.get(3).unwrap_or("").trim();
        let geo_country = if geo_raw.is_empty() {
            None
        } else {
            Some(geo_raw.to_string())
        };

        if amount <= 0.0 || currency.is_empty() || card_country.is_empty() {
            continue;
        }
        records.push(TrainingRecord {
            amount,
            currency,
            card_country,
            geo_country,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_training_csv() {
        let csv = "amount,currency,card_country,geo_country\n\
                   120.50,USD,US,US\n\
                   9000,EUR,DE,\n\
                   -3,USD,US,US\n\
                   55,GBP,GB,NG\n";
        let records = parse_training_csv(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 3); // negative amount row skipped
        assert_eq!(records[0].amount, 120.50);
        assert!(records[1].geo_country.is_none());
        assert_eq!(records[2].geo_country.as_deref(), Some("NG"));
    }

    #[test]
    fn test_parse_rejects_garbage_amount() {
        let csv = "amount,currency,card_country,geo_country\nabc,USD,US,US\n";
        assert!(parse_training_csv(csv.as_bytes()).is_err());
    }
}
