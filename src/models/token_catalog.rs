use serde::{Deserialize, Serialize};

use super::address_registry::normalize_address;

/// Name reported for assets missing from the catalog
pub const UNKNOWN_TOKEN: &str = "Unknown Token";

/// A known token contract
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenCatalogEntry {
    pub chain: String,
    pub symbol: String,
    pub contract_address: String,
}

impl TokenCatalogEntry {
    pub fn new(chain: &str, symbol: &str, contract_address: &str) -> Self {
        Self {
            chain: chain.to_string(),
            symbol: symbol.to_string(),
            contract_address: contract_address.to_string(),
        }
    }
}

/// Static lookup table from contract address to token symbol
#[derive(Debug, Clone, Default)]
pub struct TokenCatalog {
    entries: Vec<TokenCatalogEntry>,
}

impl TokenCatalog {
    pub fn new(entries: Vec<TokenCatalogEntry>) -> Self {
        Self { entries }
    }

    /// First entry whose contract address matches, ignoring case
    pub fn lookup(&self, contract_address: &str) -> Option<&TokenCatalogEntry> {
        let wanted = normalize_address(contract_address);
        self.entries
            .iter()
            .find(|entry| normalize_address(&entry.contract_address) == wanted)
    }

    /// Symbol for an asset, or "Unknown Token"
    pub fn asset_name(&self, asset: &str) -> &str {
        self.lookup(asset)
            .map(|entry| entry.symbol.as_str())
            .unwrap_or(UNKNOWN_TOKEN)
    }

    pub fn entries(&self) -> &[TokenCatalogEntry] {
        &self.entries
    }
}
