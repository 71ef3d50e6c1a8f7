//! Fixed-offset decoding of the two supported ERC-20 calls.
//!
//! Both `transfer(address,uint256)` and `transferFrom(address,address,uint256)`
//! take only static 32-byte arguments, so every field sits at a known offset in
//! the calldata body (the hex after `0x` and the 8-character selector). These
//! offsets are only valid for these two signatures.
//!
//! Addresses are sliced as-is and not validated. A length-matching blob with
//! nonstandard padding decodes to whatever the slices contain. An amount word
//! that is not hex yields no result.

use alloy_primitives::U256;

use super::transfer_classifier::{
    classify, is_token_transfer, is_token_transfer_from, TRANSFER_CALLDATA_LEN, TRANSFER_FROM_CALLDATA_LEN,
    TRANSFER_FROM_SELECTOR, TRANSFER_SELECTOR,
};
use crate::models::{DecodedCall, TokenTransferDetails, TokenTransferFromDetails, Transaction, TransferType};

/// Decodes a calldata body for a given token contract
pub type DecodeStrategy = fn(token_contract: &str, body: &str) -> Option<DecodedCall>;

/// One supported call layout
pub struct CallLayout {
    pub selector: &'static str,
    pub calldata_len: usize,
    pub transfer_type: TransferType,
    pub decode: DecodeStrategy,
}

impl CallLayout {
    pub fn matches(&self, data: &str) -> bool {
        data.starts_with(self.selector) && data.len() == self.calldata_len
    }
}

/// Every call layout the decoder understands
pub const DECODE_TABLE: [CallLayout; 2] = [
    CallLayout {
        selector: TRANSFER_SELECTOR,
        calldata_len: TRANSFER_CALLDATA_LEN,
        transfer_type: TransferType::TokenTransfer,
        decode: decode_transfer_body,
    },
    CallLayout {
        selector: TRANSFER_FROM_SELECTOR,
        calldata_len: TRANSFER_FROM_CALLDATA_LEN,
        transfer_type: TransferType::TokenTransferFrom,
        decode: decode_transfer_from_body,
    },
];

/// Decode whichever supported call the transaction carries.
///
/// None unless the classifier assigns the layout's transfer type.
pub fn decode(tx: &Transaction) -> Option<DecodedCall> {
    let transfer_type = classify(tx);
    let layout = DECODE_TABLE
        .iter()
        .find(|layout| layout.transfer_type == transfer_type && layout.matches(&tx.data))?;
    let token_contract = tx.to.as_deref()?;
    (layout.decode)(token_contract, calldata_body(&tx.data)?)
}

/// Decode an ERC-20 `transfer`. None unless the transaction is classified as one.
pub fn decode_transfer(tx: &Transaction) -> Option<TokenTransferDetails> {
    if !is_token_transfer(tx) {
        return None;
    }
    match decode_transfer_body(tx.to.as_deref()?, calldata_body(&tx.data)?)? {
        DecodedCall::Transfer(details) => Some(details),
        DecodedCall::TransferFrom(_) => None,
    }
}

/// Decode an ERC-20 `transferFrom`. None unless the transaction is classified as one.
pub fn decode_transfer_from(tx: &Transaction) -> Option<TokenTransferFromDetails> {
    if !is_token_transfer_from(tx) {
        return None;
    }
    match decode_transfer_from_body(tx.to.as_deref()?, calldata_body(&tx.data)?)? {
        DecodedCall::TransferFrom(details) => Some(details),
        DecodedCall::Transfer(_) => None,
    }
}

// body: [0,64) recipient word, [64,128) amount word
fn decode_transfer_body(token_contract: &str, body: &str) -> Option<DecodedCall> {
    let to = address_at(body, 32)?;
    let (amount, amount_hex) = amount_at(body, 72)?;

    Some(DecodedCall::Transfer(TokenTransferDetails {
        token_contract: token_contract.to_string(),
        to,
        amount,
        amount_hex,
    }))
}

// body: [0,64) sender word, [64,128) recipient word, [128,192) amount word
fn decode_transfer_from_body(token_contract: &str, body: &str) -> Option<DecodedCall> {
    let from = address_at(body, 32)?;
    let to = address_at(body, 96)?;
    let (amount, amount_hex) = amount_at(body, 160)?;

    Some(DecodedCall::TransferFrom(TokenTransferFromDetails {
        token_contract: token_contract.to_string(),
        from,
        to,
        amount,
        amount_hex,
    }))
}

fn calldata_body(data: &str) -> Option<&str> {
    data.get(SELECTOR_PREFIX_LEN..)
}

const SELECTOR_PREFIX_LEN: usize = 2 + 8;

/// Low 20 bytes of a left-padded word, skipping the 12 padding bytes
fn address_at(body: &str, start: usize) -> Option<String> {
    body.get(start..start + 40).map(|address| format!("0x{}", address))
}

fn amount_at(body: &str, start: usize) -> Option<(U256, String)> {
    let word = body.get(start..start + 64)?;
    let amount = U256::from_str_radix(word, 16).ok()?;
    Some((amount, format!("0x{}", word)))
}
