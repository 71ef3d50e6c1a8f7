use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// A transaction as observed on chain. Metadata is carried through to reports unmodified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    /// None for contract creation
    pub to: Option<String>,
    #[serde(with = "u256_decimal")]
    pub value: U256,
    /// 0x-prefixed calldata, "0x" when empty
    pub data: String,
    pub block_number: Option<u64>,
    pub block_hash: Option<String>,
    pub nonce: u64,
    pub index: Option<u64>,
    #[serde(with = "u256_decimal")]
    pub gas_limit: U256,
    #[serde(default, with = "u256_decimal_opt")]
    pub gas_price: Option<U256>,
    #[serde(default, with = "u256_decimal_opt")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default, with = "u256_decimal_opt")]
    pub max_priority_fee_per_gas: Option<U256>,
    pub chain_id: Option<u64>,
}

impl Transaction {
    /// Minimal transaction carrying only the fields classification looks at.
    pub fn new(hash: &str, from: &str, to: Option<&str>, value: U256, data: &str) -> Self {
        Self {
            hash: hash.to_string(),
            from: from.to_string(),
            to: to.map(str::to_string),
            value,
            data: data.to_string(),
            block_number: None,
            block_hash: None,
            nonce: 0,
            index: None,
            gas_limit: U256::ZERO,
            gas_price: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
            chain_id: None,
        }
    }

    /// Value in ether, for display only
    pub fn value_in_ether(&self) -> String {
        format_ether(self.value)
    }
}

/// Transfer semantics of a transaction. Exactly one tag applies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransferType {
    #[serde(rename = "ETH_TRANSFER")]
    NativeTransfer,
    #[serde(rename = "ERC20_TRANSFER")]
    TokenTransfer,
    #[serde(rename = "ERC20_TRANSFER_FROM")]
    TokenTransferFrom,
    #[serde(rename = "CONTRACT_INTERACTION")]
    ContractInteraction,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl TransferType {
    /// Stable label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            TransferType::NativeTransfer => "ETH_TRANSFER",
            TransferType::TokenTransfer => "ERC20_TRANSFER",
            TransferType::TokenTransferFrom => "ERC20_TRANSFER_FROM",
            TransferType::ContractInteraction => "CONTRACT_INTERACTION",
            TransferType::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for TransferType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Decoded ERC-20 `transfer(address,uint256)` call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenTransferDetails {
    pub token_contract: String,
    pub to: String,
    #[serde(with = "u256_decimal")]
    pub amount: U256,
    /// The raw 32-byte amount word, 0x-prefixed
    pub amount_hex: String,
}

/// Decoded ERC-20 `transferFrom(address,address,uint256)` call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenTransferFromDetails {
    pub token_contract: String,
    pub from: String,
    pub to: String,
    #[serde(with = "u256_decimal")]
    pub amount: U256,
    pub amount_hex: String,
}

/// Result of dispatching calldata through the decode table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DecodedCall {
    Transfer(TokenTransferDetails),
    TransferFrom(TokenTransferFromDetails),
}

impl DecodedCall {
    pub fn recipient(&self) -> &str {
        match self {
            DecodedCall::Transfer(details) => &details.to,
            DecodedCall::TransferFrom(details) => &details.to,
        }
    }

    pub fn amount(&self) -> U256 {
        match self {
            DecodedCall::Transfer(details) => details.amount,
            DecodedCall::TransferFrom(details) => details.amount,
        }
    }
}

/// Render a wei amount as an exact decimal ether string
pub fn format_ether(wei: U256) -> String {
    let digits = wei.to_string();
    let padded = format!("{:0>19}", digits);
    let (whole, fraction) = padded.split_at(padded.len() - 18);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// Parse a quantity given either as 0x-prefixed hex or as a decimal string
pub fn parse_u256(value: &str) -> Option<U256> {
    let trimmed = value.trim();
    match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some("") => Some(U256::ZERO),
        Some(hex) => U256::from_str_radix(hex, 16).ok(),
        None => U256::from_str_radix(trimmed, 10).ok(),
    }
}

/// Serialize U256 as a decimal string; accept decimal or hex on input.
pub mod u256_decimal {
    use alloy_primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_u256(&raw).ok_or_else(|| D::Error::custom(format!("invalid uint256: {}", raw)))
    }
}

pub mod u256_decimal_opt {
    use alloy_primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<U256>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<U256>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse_u256(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid uint256: {}", raw))),
            None => Ok(None),
        }
    }
}
