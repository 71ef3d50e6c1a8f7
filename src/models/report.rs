use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::transaction::{DecodedCall, Transaction, TransferType};
use super::webhook::WebhookRecord;

/// Why a chain transaction was reported
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    /// The decoded recipient of an ERC-20 transfer is watched
    TokenRecipient,
    /// The transaction's `to` field is watched
    DirectRecipient,
}

/// A classified transaction that touches a watched address
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChainMatch {
    pub watched_address: String,
    pub reason: MatchReason,
    pub transfer_type: TransferType,
    pub decoded: Option<DecodedCall>,
    pub transaction: Transaction,
}

impl ChainMatch {
    pub fn new(
        watched_address: &str,
        reason: MatchReason,
        transfer_type: TransferType,
        decoded: Option<DecodedCall>,
        transaction: Transaction,
    ) -> Self {
        Self {
            watched_address: watched_address.to_string(),
            reason,
            transfer_type,
            decoded,
            transaction,
        }
    }
}

/// Outcome of a pushed notification, as forwarded to the sink
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WebhookReport {
    Processed(WebhookRecord),
    Unrecognized {
        payload: Value,
        received_at: DateTime<Utc>,
    },
}

/// Everything a reporting sink can receive
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "source", content = "record", rename_all = "snake_case")]
pub enum Report {
    Chain(ChainMatch),
    Webhook(WebhookReport),
}
