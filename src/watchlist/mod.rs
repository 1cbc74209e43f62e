pub mod refresh;

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::io::Read;

use crate::config::WatchlistConfig;

/// FATF jurisdictions under increased monitoring (grey list).
const FATF_GREY_LIST: &[&str] = &[
    "AL", "BB", "BF", "BI", "BW", "CF", "DZ", "GH", "HT", "JM", "JO", "KH", "MA", "ML", "MU",
    "MZ", "NG", "PA", "PK", "SD", "SN", "SY", "TR", "UG", "YE", "ZW",
];

/// FATF call-for-action jurisdictions (black list).
const FATF_BLACK_LIST: &[&str] = &["KP", "IR"];

/// Immutable snapshot of the AML grey/black lists.
///
/// Holds flagged chain addresses and flagged jurisdictions. Loaded at
/// startup, refreshed on a background schedule, and swapped atomically so
/// concurrent readers always see one consistent snapshot.
#[derive(Debug, Clone)]
pub struct AmlWatchlist {
    pub version: String,
    pub loaded_at: DateTime<Utc>,
    addresses: HashSet<String>,
    jurisdictions: HashSet<String>,
}

impl AmlWatchlist {
    /// Load the watchlist from the configured CSV files. A missing address
    /// file yields an empty address set; a missing jurisdiction file falls
    /// back to the built-in FATF lists.
    pub fn load(config: &WatchlistConfig) -> eyre::Result<Self> {
        let addresses = match &config.address_path {
            Some(path) => {
                let file = std::fs::File::open(path)
                    .map_err(|e| eyre::eyre!("failed to open address list '{}': {}", path, e))?;
                parse_address_csv(file)?
            }
            None => HashSet::new(),
        };

        let jurisdictions = match &config.jurisdiction_path {
            Some(path) => {
                let file = std::fs::File::open(path).map_err(|e| {
                    eyre::eyre!("failed to open jurisdiction list '{}': {}", path, e)
                })?;
                parse_jurisdiction_csv(file)?
            }
            None => builtin_jurisdictions(),
        };

        let loaded_at = Utc::now();
        let snapshot = Self {
            version: format!(
                "{}a-{}j-{}",
                addresses.len(),
                jurisdictions.len(),
                loaded_at.timestamp()
            ),
            loaded_at,
            addresses,
            jurisdictions,
        };
        tracing::info!(
            addresses = snapshot.addresses.len(),
            jurisdictions = snapshot.jurisdictions.len(),
            version = %snapshot.version,
            "Loaded AML watchlist"
        );
        Ok(snapshot)
    }

    pub fn contains_address(&self, address: &str) -> bool {
        self.addresses.contains(&address.to_ascii_lowercase())
    }

    pub fn contains_jurisdiction(&self, country_code: &str) -> bool {
        self.jurisdictions
            .contains(&country_code.to_ascii_uppercase())
    }

    pub fn address_count(&self) -> usize {
        self.addresses.len()
    }

    #[cfg(test)]
    pub fn for_tests(addresses: &[&str], jurisdictions: &[&str]) -> Self {
        Self {
            version: "test".to_string(),
            loaded_at: Utc::now(),
            addresses: addresses.iter().map(|a| a.to_ascii_lowercase()).collect(),
            jurisdictions: jurisdictions
                .iter()
                .map(|j| j.to_ascii_uppercase())
                .collect(),
        }
    }
}

fn builtin_jurisdictions() -> HashSet<String> {
    FATF_GREY_LIST
        .iter()
        .chain(FATF_BLACK_LIST.iter())
        .map(|c| c.to_string())
        .collect()
}

/// Parse a flagged-address CSV.
/// Expected columns: address, category, entity_name (extra columns ignored).
pub fn parse_address_csv<R: Read>(reader: R) -> eyre::Result<HashSet<String>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut addresses = HashSet::new();
    for result in csv_reader.records() {
        let record = result?;
        let address = record.get(0).unwrap_or("").trim().to_ascii_lowercase();
        if address.starts_with("0x") {
            addresses.insert(address);
        }
    }
    Ok(addresses)
}

/// Parse a flagged-jurisdiction CSV.
/// Expected columns: country_code, list_name (extra columns ignored).
pub fn parse_jurisdiction_csv<R: Read>(reader: R) -> eyre::Result<HashSet<String>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut jurisdictions = HashSet::new();
    for result in csv_reader.records() {
        let record = result?;
        let code = record.get(0).unwrap_or("").trim().to_ascii_uppercase();
        if code.len() == 2 && code.bytes().all(|b| b.is_ascii_alphabetic()) {
            jurisdictions.insert(code);
        }
    }
    Ok(jurisdictions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_csv() {
        let csv = "address,category,entity_name\n\
                   0x8589427373D6D84E98730D7795D8f6f8731FDA16,mixer,Tornado Cash\n\
                   0x722122dF12D4e14e13Ac3b6895a86e84145b6967,mixer,Tornado Cash\n\
                   not-an-address,scam,Bogus\n";
        let addresses = parse_address_csv(csv.as_bytes()).unwrap();
        assert_eq!(addresses.len(), 2);
        assert!(addresses.contains("0x8589427373d6d84e98730d7795d8f6f8731fda16"));
    }

    #[test]
    fn test_parse_jurisdiction_csv() {
        let csv = "country_code,list_name\nng,grey\nIR,black\nXYZ,grey\n";
        let jurisdictions = parse_jurisdiction_csv(csv.as_bytes()).unwrap();
        assert_eq!(jurisdictions.len(), 2);
        assert!(jurisdictions.contains("NG"));
        assert!(jurisdictions.contains("IR"));
    }

    #[test]
    fn test_lookups_are_case_insensitive() {
        let list = AmlWatchlist::for_tests(&["0xABCDEF0000000000000000000000000000000000"], &["ng"]);
        assert!(list.contains_address("0xabcdef0000000000000000000000000000000000"));
        assert!(list.contains_jurisdiction("NG"));
        assert!(list.contains_jurisdiction("ng"));
        assert!(!list.contains_jurisdiction("US"));
    }

    #[test]
    fn test_builtin_fatf_fallback() {
        let list = AmlWatchlist::load(&WatchlistConfig::default()).unwrap();
        assert!(list.contains_jurisdiction("NG"));
        assert!(list.contains_jurisdiction("KP"));
        assert!(!list.contains_jurisdiction("US"));
        assert_eq!(list.address_count(), 0);
    }
}
