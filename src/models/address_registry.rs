use std::collections::HashSet;

use crate::error::ConfigError;

/// Watched addresses. Read-only once built; lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct AddressRegistry {
    addresses: HashSet<String>,
}

impl AddressRegistry {
    /// Build a registry from a list of addresses, with or without 0x prefix
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let addresses = addresses
            .into_iter()
            .map(|address| normalize_address(address.as_ref()))
            .filter(|address| !address.is_empty())
            .collect();

        Self { addresses }
    }

    /// Build a registry from configuration, rejecting malformed entries
    pub fn from_config(addresses: &[String]) -> Result<Self, ConfigError> {
        for address in addresses {
            validate_address(address)?;
        }
        Ok(Self::new(addresses))
    }

    /// Check if an address is watched
    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(&normalize_address(address))
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// All watched addresses, 0x-prefixed and sorted
    pub fn addresses(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .addresses
            .iter()
            .map(|address| format!("0x{}", address))
            .collect();
        all.sort();
        all
    }
}

/// Normalize an address to lowercase without 0x prefix
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let without_prefix = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    without_prefix.to_lowercase()
}

/// Validate that an address is a 20-byte hex string
pub fn validate_address(address: &str) -> Result<(), ConfigError> {
    let normalized = normalize_address(address);

    if normalized.len() != 40 || !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::InvalidAddress(address.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_A: &str = "0x2C57E373624D66B7a2E000A91E12ED6B865D57BA";
    const USER_B: &str = "0xE90ACFD806d52c857AD0a2705D49A4F846ACfDAE";

    fn registry() -> AddressRegistry {
        AddressRegistry::new([USER_A, USER_B])
    }

    #[test]
    fn test_membership_is_case_insensitive() {
        let registry = registry();

        assert!(registry.contains(USER_A));
        assert!(registry.contains(&USER_A.to_lowercase()));
        assert!(registry.contains("0X2C57E373624D66B7A2E000A91E12ED6B865D57BA"));
        assert_eq!(
            registry.contains("0xE90ACFD806d52c857AD0a2705D49A4F846ACfDAE"),
            registry.contains("0xe90acfd806d52c857ad0a2705d49a4f846acfdae")
        );
    }

    #[test]
    fn test_membership_without_prefix_and_with_whitespace() {
        let registry = registry();
        assert!(registry.contains("2c57e373624d66b7a2e000a91e12ed6b865d57ba"));
        assert!(registry.contains("  0x2c57e373624d66b7a2e000a91e12ed6b865d57ba  "));
    }

    #[test]
    fn test_absent_address_is_not_a_match() {
        let registry = registry();
        assert!(!registry.contains("0x0000000000000000000000000000000000000000"));
        assert!(!registry.contains(""));
        assert!(!registry.contains("0x2c57"));
    }

    #[test]
    fn test_addresses_are_normalized_and_sorted() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.addresses(),
            vec![
                "0x2c57e373624d66b7a2e000a91e12ed6b865d57ba".to_string(),
                "0xe90acfd806d52c857ad0a2705d49a4f846acfdae".to_string(),
            ]
        );
    }

    #[test]
    fn test_duplicates_collapse() {
        let registry = AddressRegistry::new([USER_A, &USER_A.to_lowercase()]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_from_config_rejects_malformed_addresses() {
        let valid = vec![USER_A.to_string()];
        assert!(AddressRegistry::from_config(&valid).is_ok());

        let too_short = vec!["0x123".to_string()];
        assert!(matches!(
            AddressRegistry::from_config(&too_short),
            Err(ConfigError::InvalidAddress(_))
        ));

        let not_hex = vec!["0x5C95260eBD1dD21547528E73dc601d74B2793e0Y".to_string()];
        assert!(AddressRegistry::from_config(&not_hex).is_err());
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(normalize_address("0xABCdef"), "abcdef");
        assert_eq!(normalize_address("0XABCDEF"), "abcdef");
        assert_eq!(normalize_address(" abcdef "), "abcdef");
    }
}
