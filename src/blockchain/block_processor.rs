use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::timeout;

use super::abi_decoder;
use super::data_source::{BlockTransaction, ChainDataSource};
use super::transfer_classifier::classify;
use crate::error::{ProcessingError, WatcherError};
use crate::logging::{ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{AddressRegistry, ChainMatch, DecodedCall, MatchReason, Report, Transaction, TransferType};
use crate::sink::ReportSink;

/// Outcome of processing one block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    pub block_number: u64,
    pub transaction_count: usize,
    pub matches: usize,
    pub failures: usize,
    pub duration_ms: u64,
}

/// Classifies every transaction in a block and reports the ones touching watched addresses
#[derive(Clone)]
pub struct BlockProcessor {
    source: Arc<dyn ChainDataSource>,
    registry: Arc<AddressRegistry>,
    sink: Arc<dyn ReportSink>,
    tx_fetch_timeout: Duration,
}

/// A transaction that could not be processed
struct TransactionFailure {
    hash: Option<String>,
    error: WatcherError,
}

impl BlockProcessor {
    pub fn new(
        source: Arc<dyn ChainDataSource>,
        registry: Arc<AddressRegistry>,
        sink: Arc<dyn ReportSink>,
        tx_fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            registry,
            sink,
            tx_fetch_timeout,
        }
    }

    pub fn registry(&self) -> &AddressRegistry {
        &self.registry
    }

    /// Fetch a block and process each of its transactions concurrently.
    ///
    /// Only a failure to fetch the block itself is returned as an error. A
    /// transaction that fails is counted in the summary and logged once every
    /// sibling has finished.
    pub async fn process_block(&self, block_number: u64) -> Result<BlockSummary, WatcherError> {
        let monitor = PerformanceMonitor::new("process_block")
            .with_metadata("block_number", json!(block_number));

        let block = self.source.get_block(block_number).await?;
        let transaction_count = block.transactions.len();

        if block.is_empty() {
            LogContext::new("block_processor", "process_block")
                .with_block_number(block_number)
                .debug("Block has no transactions");
            return Ok(BlockSummary {
                block_number,
                transaction_count: 0,
                matches: 0,
                failures: 0,
                duration_ms: monitor.finish(),
            });
        }

        let mut tasks = JoinSet::new();
        for entry in block.transactions {
            let processor = self.clone();
            tasks.spawn(async move {
                let hash = entry.hash().to_string();
                processor
                    .process_entry(entry)
                    .await
                    .map_err(|error| TransactionFailure { hash: Some(hash), error })
            });
        }

        let mut matches = 0;
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(found)) => matches += found,
                Ok(Err(failure)) => failures.push(failure),
                Err(join_error) => failures.push(TransactionFailure {
                    hash: None,
                    error: ProcessingError::TaskAborted(join_error.to_string()).into(),
                }),
            }
        }

        for failure in &failures {
            let mut context = LogContext::new("block_processor", "process_transaction")
                .with_block_number(block_number);
            if let Some(hash) = &failure.hash {
                context = context.with_transaction_hash(hash);
            }
            ErrorLogger::log_error(&failure.error, Some(context));
        }

        let summary = BlockSummary {
            block_number,
            transaction_count,
            matches,
            failures: failures.len(),
            duration_ms: monitor.finish(),
        };

        MetricsLogger::log_block_processed(
            summary.block_number,
            summary.transaction_count,
            summary.matches,
            summary.failures,
            summary.duration_ms,
        );

        Ok(summary)
    }

    /// Resolve, classify and report one block entry; returns the number of reports made
    async fn process_entry(&self, entry: BlockTransaction) -> Result<usize, WatcherError> {
        let tx = match entry {
            BlockTransaction::Full(tx) => *tx,
            BlockTransaction::Hash(hash) => self.fetch_transaction(&hash).await?,
            BlockTransaction::Malformed { hash, reason } => {
                return Err(ProcessingError::TransactionParsing(format!("{}: {}", hash, reason)).into());
            }
        };

        let found = match_transaction(&self.registry, &tx);
        let count = found.len();

        for chain_match in found {
            let watched = chain_match.watched_address.clone();
            let label = chain_match.transfer_type.label();
            self.sink.report(Report::Chain(chain_match)).await?;
            MetricsLogger::log_match_reported(&watched, &tx.hash, label);
        }

        Ok(count)
    }

    async fn fetch_transaction(&self, hash: &str) -> Result<Transaction, WatcherError> {
        match timeout(self.tx_fetch_timeout, self.source.get_transaction(hash)).await {
            Ok(result) => result,
            Err(_) => Err(ProcessingError::FetchTimeout {
                hash: hash.to_string(),
                seconds: self.tx_fetch_timeout.as_secs(),
            }
            .into()),
        }
    }
}

/// Everything a single transaction should be reported for.
///
/// The decoded recipient of a token `transfer` and the raw `to` field are
/// checked independently, so one transaction can yield two matches.
pub fn match_transaction(registry: &AddressRegistry, tx: &Transaction) -> Vec<ChainMatch> {
    let transfer_type = classify(tx);
    let decoded = abi_decoder::decode(tx);
    let mut found = Vec::new();

    if transfer_type == TransferType::TokenTransfer {
        if let Some(DecodedCall::Transfer(details)) = &decoded {
            if registry.contains(&details.to) {
                found.push(ChainMatch::new(
                    &details.to,
                    MatchReason::TokenRecipient,
                    transfer_type,
                    decoded.clone(),
                    tx.clone(),
                ));
            }
        }
    }

    if let Some(to) = tx.to.as_deref() {
        if registry.contains(to) {
            found.push(ChainMatch::new(
                to,
                MatchReason::DirectRecipient,
                transfer_type,
                decoded,
                tx.clone(),
            ));
        }
    }

    found
}
