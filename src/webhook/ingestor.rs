use chrono::Utc;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::ExplorerConfig;
use crate::error::WebhookError;
use crate::logging::{LogContext, MetricsLogger};
use crate::models::{Direction, Report, TokenCatalog, WebhookNotification, WebhookRecord, WebhookReport};
use crate::sink::ReportSink;

/// The notification replayed by the `/test` endpoint
static SAMPLE_NOTIFICATION: Lazy<Value> = Lazy::new(|| {
    json!({
        "address": "0xff5ded1d122a0c2279fcf65b42f2ff6d1afebae4",
        "amount": "0.001",
        "asset": "ETH",
        "blockNumber": 2913059,
        "counterAddress": "0x690B9A9E9aa1C9dB991C7721a92d351Db4FaC990",
        "txId": "0x062d236ccc044f68194a04008e98c3823271dc26160a4db9ae9303f9ecfc7bf6",
        "type": "native",
        "tokeName": "usdt",
        "chain": "ethereum-sepolia",
        "subscriptionType": "ADDRESS_EVENT"
    })
});

pub fn sample_notification() -> &'static Value {
    &SAMPLE_NOTIFICATION
}

/// What became of an ingested payload
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Processed(WebhookRecord),
    Unrecognized,
}

impl IngestOutcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, IngestOutcome::Processed(_))
    }
}

/// Validates pushed address-event notifications and forwards them to the sink
#[derive(Clone)]
pub struct WebhookIngestor {
    catalog: Arc<TokenCatalog>,
    explorer: ExplorerConfig,
    sink: Arc<dyn ReportSink>,
}

impl WebhookIngestor {
    pub fn new(catalog: Arc<TokenCatalog>, explorer: ExplorerConfig, sink: Arc<dyn ReportSink>) -> Self {
        Self { catalog, explorer, sink }
    }

    /// Ingest a raw request body. Bytes that are not JSON are an error.
    pub async fn ingest_bytes(&self, body: &[u8]) -> Result<IngestOutcome, WebhookError> {
        let payload: Value = serde_json::from_slice(body)?;
        self.ingest(&payload).await
    }

    /// Ingest a parsed payload.
    ///
    /// A payload that is not a recognizable address event is still forwarded,
    /// marked unrecognized. Only a sink failure is an error.
    pub async fn ingest(&self, payload: &Value) -> Result<IngestOutcome, WebhookError> {
        let received_at = Utc::now();

        let Some(notification) = WebhookNotification::from_payload(payload) else {
            MetricsLogger::log_webhook_received(false, None);
            self.sink
                .report(Report::Webhook(WebhookReport::Unrecognized {
                    payload: payload.clone(),
                    received_at,
                }))
                .await?;
            return Ok(IngestOutcome::Unrecognized);
        };

        MetricsLogger::log_webhook_received(true, Some(&notification.tx_id));

        let record = WebhookRecord {
            token_name: self.catalog.asset_name(&notification.asset).to_string(),
            direction: Direction::from_amount(&notification.amount),
            explorer_url: self.explorer_url(&notification.chain, &notification.tx_id),
            received_at,
            notification,
        };

        LogContext::new("webhook", "ingest")
            .with_address(&record.notification.address)
            .with_transaction_hash(&record.notification.tx_id)
            .with_metadata("token_name", json!(record.token_name))
            .debug("Address event notification recognized");

        self.sink
            .report(Report::Webhook(WebhookReport::Processed(record.clone())))
            .await?;

        Ok(IngestOutcome::Processed(record))
    }

    /// Explorer link for a transaction on the named chain; anything not sepolia links to mainnet.
    /// Chain names arrive lowercase, and the match is exact-case.
    pub fn explorer_url(&self, chain: &str, tx_id: &str) -> String {
        let base = if chain.contains("sepolia") {
            &self.explorer.sepolia_url
        } else {
            &self.explorer.mainnet_url
        };
        format!("{}{}", base, tx_id)
    }
}
