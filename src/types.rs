use crate::error::RiskError;

/// A transaction submitted for scoring. At least one channel must be present.
#[derive(Debug, Clone)]
pub enum Transaction {
    Fiat(FiatDetails),
    Crypto(CryptoDetails),
    Mixed {
        fiat: FiatDetails,
        crypto: CryptoDetails,
    },
}

impl Transaction {
    /// Build a transaction from optional channel details.
    /// Absence of both channels is a validation error.
    pub fn from_parts(
        fiat: Option<FiatDetails>,
        crypto: Option<CryptoDetails>,
    ) -> Result<Self, RiskError> {
        match (fiat, crypto) {
            (Some(f), Some(c)) => Ok(Self::Mixed { fiat: f, crypto: c }),
            (Some(f), None) => Ok(Self::Fiat(f)),
            (None, Some(c)) => Ok(Self::Crypto(c)),
            (None, None) => Err(RiskError::validation(
                "transaction",
                "at least one of the fiat or crypto channels is required",
            )),
        }
    }

    pub fn fiat(&self) -> Option<&FiatDetails> {
        match self {
            Self::Fiat(f) => Some(f),
            Self::Mixed { fiat, .. } => Some(fiat),
            Self::Crypto(_) => None,
        }
    }

    pub fn crypto(&self) -> Option<&CryptoDetails> {
        match self {
            Self::Crypto(c) => Some(c),
            Self::Mixed { crypto, .. } => Some(crypto),
            Self::Fiat(_) => None,
        }
    }

    pub fn validate(&self) -> Result<(), RiskError> {
        if let Some(f) = self.fiat() {
            f.validate()?;
        }
        if let Some(c) = self.crypto() {
            c.validate()?;
        }
        Ok(())
    }
}

/// Card-rail side of a transaction.
#[derive(Debug, Clone)]
pub struct FiatDetails {
    pub amount: f64,
    pub currency: String,
    pub card_country: String,
    /// Country derived from the originating IP. None means unknown,
    /// which is kept distinct from a matching country.
    pub geo_country: Option<String>,
}

impl FiatDetails {
    pub fn validate(&self) -> Result<(), RiskError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(RiskError::validation(
                "amount",
                format!("must be a positive number, got {}", self.amount),
            ));
        }
        validate_currency_code("currency", &self.currency)?;
        validate_country_code("card_country", &self.card_country)?;
        if let Some(geo) = &self.geo_country {
            validate_country_code("geo_ip", geo)?;
        }
        Ok(())
    }
}

/// Crypto side of a transaction. Chain analytics for the address are
/// supplied separately by the analytics provider.
#[derive(Debug, Clone)]
pub struct CryptoDetails {
    pub address: String,
    pub currency: String,
    pub amount: f64,
}

impl CryptoDetails {
    pub fn validate(&self) -> Result<(), RiskError> {
        if !is_valid_chain_address(&self.address) {
            return Err(RiskError::validation(
                "address",
                format!("'{}' is not a valid chain address", self.address),
            ));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(RiskError::validation(
                "crypto_amount",
                format!("must be a non-negative number, got {}", self.amount),
            ));
        }
        validate_currency_code("crypto_currency", &self.currency)?;
        Ok(())
    }
}

/// The scoring result returned to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    /// Fused cross-channel risk, 0..=100.
    pub total_risk: u8,
    /// Ordered, distinct human-readable justifications.
    pub alerts: Vec<String>,
    /// Per-channel sub-scores on the 0-100 scale, when the channel was present.
    pub fiat_risk: Option<f64>,
    pub crypto_risk: Option<f64>,
}

/// 0x-prefixed 40-hex-char address (Ethereum-compatible chains).
pub fn is_valid_chain_address(address: &str) -> bool {
    let Some(hex) = address.strip_prefix("0x") else {
        return false;
    };
    hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit())
}

fn validate_country_code(field: &'static str, code: &str) -> Result<(), RiskError> {
    if code.len() == 2 && code.bytes().all(|b| b.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(RiskError::validation(
            field,
            format!("'{}' is not a two-letter country code", code),
        ))
    }
}

fn validate_currency_code(field: &'static str, code: &str) -> Result<(), RiskError> {
    if (2..=6).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(RiskError::validation(
            field,
            format!("'{}' is not a valid currency code", code),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fiat() -> FiatDetails {
        FiatDetails {
            amount: 1000.0,
            currency: "USD".to_string(),
            card_country: "US".to_string(),
            geo_country: Some("NG".to_string()),
        }
    }

    fn crypto() -> CryptoDetails {
        CryptoDetails {
            address: "0x742d35cc6634c0532925a3b844bc454e4438f44e".to_string(),
            currency: "ETH".to_string(),
            amount: 0.1,
        }
    }

    #[test]
    fn test_requires_at_least_one_channel() {
        let err = Transaction::from_parts(None, None).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_channel_accessors() {
        let tx = Transaction::from_parts(Some(fiat()), Some(crypto())).unwrap();
        assert!(tx.fiat().is_some());
        assert!(tx.crypto().is_some());

        let tx = Transaction::from_parts(None, Some(crypto())).unwrap();
        assert!(tx.fiat().is_none());
        assert!(tx.crypto().is_some());
    }

    #[test]
    fn test_rejects_non_positive_fiat_amount() {
        let mut details = fiat();
        details.amount = 0.0;
        assert!(details.validate().is_err());
        details.amount = -5.0;
        assert!(details.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_country_code() {
        let mut details = fiat();
        details.card_country = "USA".to_string();
        assert!(details.validate().is_err());
    }

    #[test]
    fn test_crypto_amount_may_be_zero() {
        let mut details = crypto();
        details.amount = 0.0;
        assert!(details.validate().is_ok());
    }

    #[test]
    fn test_chain_address_format() {
        assert!(is_valid_chain_address(
            "0x742d35Cc6634C0532925a3b844Bc454e4438f44e"
        ));
        assert!(!is_valid_chain_address("not-an-address"));
        assert!(!is_valid_chain_address("0x1234"));
    }
}
