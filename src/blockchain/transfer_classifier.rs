use crate::models::{Transaction, TransferType};

/// ERC-20 `transfer(address,uint256)` selector
pub const TRANSFER_SELECTOR: &str = "0xa9059cbb";

/// ERC-20 `transferFrom(address,address,uint256)` selector
pub const TRANSFER_FROM_SELECTOR: &str = "0x23b872dd";

/// 0x + selector + two words
pub const TRANSFER_CALLDATA_LEN: usize = 2 + 8 + 64 + 64;

/// 0x + selector + three words
pub const TRANSFER_FROM_CALLDATA_LEN: usize = 2 + 8 + 64 + 64 + 64;

/// Calldata no longer than this is at most a bare selector
pub const SELECTOR_CALLDATA_LEN: usize = 2 + 8;

/// Assign exactly one transfer type to a transaction.
///
/// Rules are evaluated in order and the first match wins. The token rules do
/// not look at `value`, so a nonzero-value call to `transfer` still reaches them
/// only because its calldata is too long to be a native transfer.
pub fn classify(tx: &Transaction) -> TransferType {
    if is_native_transfer(tx) {
        TransferType::NativeTransfer
    } else if is_token_transfer(tx) {
        TransferType::TokenTransfer
    } else if is_token_transfer_from(tx) {
        TransferType::TokenTransferFrom
    } else if is_contract_interaction(tx) {
        TransferType::ContractInteraction
    } else {
        TransferType::Unknown
    }
}

/// Nonzero value with empty or selector-sized calldata.
///
/// A bare 4-byte selector with value attached is treated as a plain transfer.
pub fn is_native_transfer(tx: &Transaction) -> bool {
    !tx.value.is_zero() && (tx.data == "0x" || tx.data.len() <= SELECTOR_CALLDATA_LEN)
}

pub fn is_token_transfer(tx: &Transaction) -> bool {
    tx.data.starts_with(TRANSFER_SELECTOR) && tx.data.len() == TRANSFER_CALLDATA_LEN
}

pub fn is_token_transfer_from(tx: &Transaction) -> bool {
    tx.data.starts_with(TRANSFER_FROM_SELECTOR) && tx.data.len() == TRANSFER_FROM_CALLDATA_LEN
}

/// Calldata longer than a bare selector, sent to an existing account
pub fn is_contract_interaction(tx: &Transaction) -> bool {
    tx.data.len() > SELECTOR_CALLDATA_LEN && tx.to.is_some()
}

/// Any transaction that involves tokens or contract calls
pub fn is_token_transaction(tx: &Transaction) -> bool {
    is_token_transfer(tx) || is_token_transfer_from(tx) || is_contract_interaction(tx)
}
