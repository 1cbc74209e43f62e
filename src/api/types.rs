use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RiskError;
use crate::scoring::fusion::RiskLevel;
use crate::types::{CryptoDetails, FiatDetails, RiskAssessment, Transaction};

// ============================================================
// Request
// ============================================================

/// Flat assessment request. The fiat subset is amount/currency/card_country
/// (geo_ip optional); the crypto subset is address/crypto_currency
/// (crypto_amount optional, defaults to 0). At least one subset is required.
#[derive(Debug, Deserialize)]
pub struct AssessRequest {
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub card_country: Option<String>,
    /// Country code derived from the originating IP. A raw IPv4 literal is
    /// accepted but treated as unknown since geo resolution happens upstream.
    pub geo_ip: Option<String>,
    pub address: Option<String>,
    pub crypto_currency: Option<String>,
    pub crypto_amount: Option<f64>,
}

impl AssessRequest {
    pub fn into_transaction(self) -> Result<Transaction, RiskError> {
        let has_fiat =
            self.amount.is_some() || self.currency.is_some() || self.card_country.is_some();
        let fiat = if has_fiat {
            Some(FiatDetails {
                amount: self
                    .amount
                    .ok_or_else(|| RiskError::validation("amount", "required for fiat channel"))?,
                currency: self.currency.ok_or_else(|| {
                    RiskError::validation("currency", "required for fiat channel")
                })?,
                card_country: self.card_country.ok_or_else(|| {
                    RiskError::validation("card_country", "required for fiat channel")
                })?,
                geo_country: self.geo_ip.and_then(normalize_geo),
            })
        } else {
            None
        };

        let has_crypto = self.address.is_some() || self.crypto_currency.is_some();
        let crypto = if has_crypto {
            Some(CryptoDetails {
                address: self.address.ok_or_else(|| {
                    RiskError::validation("address", "required for crypto channel")
                })?,
                currency: self.crypto_currency.ok_or_else(|| {
                    RiskError::validation("crypto_currency", "required for crypto channel")
                })?,
                amount: self.crypto_amount.unwrap_or(0.0),
            })
        } else {
            None
        };

        let transaction = Transaction::from_parts(fiat, crypto)?;
        transaction.validate()?;
        Ok(transaction)
    }
}

/// Keep two-letter codes; IPv4 literals mean the upstream geo lookup did
/// not run, so the geo feature stays unknown rather than failing the request.
fn normalize_geo(value: String) -> Option<String> {
    if is_ipv4(&value) {
        None
    } else {
        Some(value)
    }
}

fn is_ipv4(value: &str) -> bool {
    let octets: Vec<&str> = value.split('.').collect();
    octets.len() == 4 && octets.iter().all(|o| o.parse::<u8>().is_ok())
}

// ============================================================
// Responses
// ============================================================

#[derive(Debug, Serialize)]
pub struct AssessResponse {
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub alerts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiat_risk: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crypto_risk: Option<f64>,
}

impl From<RiskAssessment> for AssessResponse {
    fn from(assessment: RiskAssessment) -> Self {
        Self {
            risk_score: assessment.total_risk,
            risk_level: RiskLevel::from_score(assessment.total_risk),
            alerts: assessment.alerts,
            fiat_risk: assessment.fiat_risk,
            crypto_risk: assessment.crypto_risk,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_version: String,
    pub model_fitted_at: DateTime<Utc>,
    pub watchlist_version: String,
    pub watchlist_addresses: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}
