use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;

use crate::error::SinkError;
use crate::logging::LogContext;
use crate::models::{Report, WebhookReport};

/// Destination for chain matches and webhook notifications
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn report(&self, report: Report) -> Result<(), SinkError>;
}

/// Writes every report as a structured log record
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl ReportSink for LogSink {
    async fn report(&self, report: Report) -> Result<(), SinkError> {
        let record = serde_json::to_value(&report)
            .map_err(|e| SinkError::Serialization(e.to_string()))?;

        match &report {
            Report::Chain(found) => {
                LogContext::new("report", "chain_match")
                    .with_address(&found.watched_address)
                    .with_transaction_hash(&found.transaction.hash)
                    .with_transfer_type(found.transfer_type.label())
                    .with_metadata("record", record)
                    .info(&format!(
                        "Watched address {} found in transaction {}",
                        found.watched_address, found.transaction.hash
                    ));
            }
            Report::Webhook(WebhookReport::Processed(processed)) => {
                LogContext::new("report", "webhook_notification")
                    .with_address(&processed.notification.address)
                    .with_transaction_hash(&processed.notification.tx_id)
                    .with_metadata("direction", json!(processed.direction.to_string()))
                    .with_metadata("explorer_url", json!(processed.explorer_url))
                    .with_metadata("record", record)
                    .info(&format!(
                        "{} {} {} ({})",
                        processed.direction,
                        processed.notification.amount,
                        processed.token_name,
                        processed.notification.kind.map_or("UNTYPED", |kind| kind.label())
                    ));
            }
            Report::Webhook(WebhookReport::Unrecognized { .. }) => {
                LogContext::new("report", "webhook_unrecognized")
                    .with_metadata("record", record)
                    .warn("Webhook payload with unrecognized format");
            }
        }

        Ok(())
    }
}

/// Keeps reports in memory, in arrival order
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<Report>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far
    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().map(|reports| reports.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReportSink for MemorySink {
    async fn report(&self, report: Report) -> Result<(), SinkError> {
        self.reports
            .lock()
            .map_err(|_| SinkError::Unavailable("report buffer poisoned".to_string()))?
            .push(report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChainMatch, MatchReason, Transaction, TransferType};
    use alloy_primitives::U256;
    use chrono::Utc;

    fn chain_report() -> Report {
        let tx = Transaction::new(
            "0xabc",
            "0x690b9a9e9aa1c9db991c7721a92d351db4fac990",
            Some("0x29772ce1cb7c1cefcae07fa7f03dc7d2de8cba83"),
            U256::from(1_000u64),
            "0x",
        );
        Report::Chain(ChainMatch::new(
            "0x29772ce1cb7c1cefcae07fa7f03dc7d2de8cba83",
            MatchReason::DirectRecipient,
            TransferType::NativeTransfer,
            None,
            tx,
        ))
    }

    #[tokio::test]
    async fn test_log_sink_accepts_every_report_kind() {
        let sink = LogSink;
        assert!(sink.report(chain_report()).await.is_ok());

        let unrecognized = Report::Webhook(WebhookReport::Unrecognized {
            payload: json!({"hello": "world"}),
            received_at: Utc::now(),
        });
        assert!(sink.report(unrecognized).await.is_ok());
    }

    #[tokio::test]
    async fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.report(chain_report()).await.unwrap();
        sink.report(Report::Webhook(WebhookReport::Unrecognized {
            payload: json!(null),
            received_at: Utc::now(),
        }))
        .await
        .unwrap();

        let reports = sink.reports();
        assert_eq!(reports.len(), 2);
        assert!(matches!(reports[0], Report::Chain(_)));
        assert!(matches!(reports[1], Report::Webhook(_)));
    }

    #[test]
    fn test_report_serialization_shape() {
        let value = serde_json::to_value(chain_report()).unwrap();
        assert_eq!(value["source"], "chain");
        assert_eq!(value["record"]["reason"], "direct_recipient");
        assert_eq!(value["record"]["transfer_type"], "ETH_TRANSFER");
    }
}
