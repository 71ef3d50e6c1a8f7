use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::signal;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, MissedTickBehavior};

use super::block_processor::{BlockProcessor, BlockSummary};
use super::data_source::ChainDataSource;
use crate::config::MonitorConfig;
use crate::error::WatcherError;
use crate::logging::{ErrorLogger, LogContext};
use crate::models::AddressRegistry;
use crate::sink::ReportSink;

const SUBSCRIPTION_BUFFER: usize = 64;

/// Running totals since the monitor started
#[derive(Debug, Default)]
struct MonitorCounters {
    last_block_seen: AtomicU64,
    blocks_processed: AtomicU64,
    blocks_failed: AtomicU64,
    transactions_seen: AtomicU64,
    matches_reported: AtomicU64,
    transaction_failures: AtomicU64,
}

impl MonitorCounters {
    fn record(&self, summary: &BlockSummary) {
        self.blocks_processed.fetch_add(1, Ordering::Relaxed);
        self.transactions_seen.fetch_add(summary.transaction_count as u64, Ordering::Relaxed);
        self.matches_reported.fetch_add(summary.matches as u64, Ordering::Relaxed);
        self.transaction_failures.fetch_add(summary.failures as u64, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorStatus {
    pub is_running: bool,
    pub last_block_seen: u64,
    pub blocks_processed: u64,
    pub blocks_failed: u64,
    pub transactions_seen: u64,
    pub matches_reported: u64,
    pub transaction_failures: u64,
}

/// Follows the chain head and hands every new block to a [`BlockProcessor`]
pub struct ChainMonitor {
    source: Arc<dyn ChainDataSource>,
    processor: BlockProcessor,
    poll_interval: Duration,
    max_concurrent_blocks: usize,
    counters: Arc<MonitorCounters>,
    pub shutdown_signal: Arc<AtomicBool>,
}

impl ChainMonitor {
    pub fn new(
        source: Arc<dyn ChainDataSource>,
        registry: Arc<AddressRegistry>,
        sink: Arc<dyn ReportSink>,
        config: &MonitorConfig,
    ) -> Self {
        let processor = BlockProcessor::new(
            Arc::clone(&source),
            registry,
            sink,
            Duration::from_secs(config.tx_fetch_timeout_seconds),
        );

        Self {
            source,
            processor,
            poll_interval: Duration::from_secs(config.poll_interval_seconds),
            max_concurrent_blocks: config.max_concurrent_blocks.max(1),
            counters: Arc::new(MonitorCounters::default()),
            shutdown_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Override the head polling interval
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run until Ctrl-C, `shutdown()`, or loss of the block subscription
    pub async fn start(&self) -> Result<(), WatcherError> {
        let shutdown_signal = Arc::clone(&self.shutdown_signal);
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received shutdown signal");
                    shutdown_signal.store(true, Ordering::Relaxed);
                }
                Err(err) => {
                    error!("Unable to listen for shutdown signal: {}", err);
                }
            }
        });

        self.run().await
    }

    /// Main loop without signal handling
    pub async fn run(&self) -> Result<(), WatcherError> {
        let context = LogContext::new("chain_monitor", "start")
            .with_metadata("poll_interval_ms", serde_json::json!(self.poll_interval.as_millis() as u64))
            .with_metadata("max_concurrent_blocks", serde_json::json!(self.max_concurrent_blocks))
            .with_metadata("watched_addresses", serde_json::json!(self.processor.registry().len()));
        context.info("Starting chain monitor");

        let (mut blocks, subscription) = spawn_block_subscription(
            Arc::clone(&self.source),
            self.poll_interval,
            Arc::clone(&self.shutdown_signal),
        );

        let permits = Arc::new(Semaphore::new(self.max_concurrent_blocks));
        let mut in_flight: JoinSet<(u64, Result<BlockSummary, WatcherError>)> = JoinSet::new();

        loop {
            tokio::select! {
                next = blocks.recv() => {
                    let Some(block_number) = next else {
                        info!("Block subscription closed, stopping chain monitor");
                        break;
                    };

                    self.counters.last_block_seen.store(block_number, Ordering::Relaxed);

                    // Waits only when max_concurrent_blocks blocks are already in flight
                    let permit = match Arc::clone(&permits).acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };

                    let processor = self.processor.clone();
                    in_flight.spawn(async move {
                        let _permit = permit;
                        (block_number, processor.process_block(block_number).await)
                    });
                }
                Some(finished) = in_flight.join_next(), if !in_flight.is_empty() => {
                    self.record_block(finished);
                }
            }
        }

        while let Some(finished) = in_flight.join_next().await {
            self.record_block(finished);
        }
        subscription.abort();

        let status = self.status();
        LogContext::new("chain_monitor", "stop")
            .with_metadata("blocks_processed", serde_json::json!(status.blocks_processed))
            .with_metadata("matches_reported", serde_json::json!(status.matches_reported))
            .info("Chain monitor stopped");

        Ok(())
    }

    fn record_block(
        &self,
        finished: Result<(u64, Result<BlockSummary, WatcherError>), tokio::task::JoinError>,
    ) {
        match finished {
            Ok((_, Ok(summary))) => self.counters.record(&summary),
            Ok((block_number, Err(e))) => {
                self.counters.blocks_failed.fetch_add(1, Ordering::Relaxed);
                let context = LogContext::new("chain_monitor", "process_block")
                    .with_block_number(block_number);
                ErrorLogger::log_error(&e, Some(context));
                warn!("Skipping block {} due to processing error", block_number);
            }
            Err(join_error) => {
                self.counters.blocks_failed.fetch_add(1, Ordering::Relaxed);
                error!("Block processing task aborted: {}", join_error);
            }
        }
    }

    /// Request graceful shutdown
    pub fn shutdown(&self) {
        info!("Requesting graceful shutdown");
        self.shutdown_signal.store(true, Ordering::Relaxed);
    }

    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            is_running: !self.shutdown_signal.load(Ordering::Relaxed),
            last_block_seen: self.counters.last_block_seen.load(Ordering::Relaxed),
            blocks_processed: self.counters.blocks_processed.load(Ordering::Relaxed),
            blocks_failed: self.counters.blocks_failed.load(Ordering::Relaxed),
            transactions_seen: self.counters.transactions_seen.load(Ordering::Relaxed),
            matches_reported: self.counters.matches_reported.load(Ordering::Relaxed),
            transaction_failures: self.counters.transaction_failures.load(Ordering::Relaxed),
        }
    }
}

/// Poll the chain head and emit each new block number once, in order.
///
/// The head at subscription time is the first block emitted. The channel
/// closes on shutdown, when the receiver is dropped, or on a non-recoverable
/// error from the data source.
pub fn spawn_block_subscription(
    source: Arc<dyn ChainDataSource>,
    poll_interval: Duration,
    shutdown: Arc<AtomicBool>,
) -> (mpsc::Receiver<u64>, JoinHandle<()>) {
    let (sender, receiver) = mpsc::channel(SUBSCRIPTION_BUFFER);

    let handle = tokio::spawn(async move {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut next_block: Option<u64> = None;

        loop {
            ticker.tick().await;

            if shutdown.load(Ordering::Relaxed) {
                debug!("Shutdown requested, closing block subscription");
                return;
            }

            let latest = match source.latest_block_number().await {
                Ok(latest) => latest,
                Err(e) if e.is_recoverable() => {
                    warn!("Failed to poll latest block, will retry: {}", e);
                    continue;
                }
                Err(e) => {
                    ErrorLogger::log_error(&e, Some(LogContext::new("chain_monitor", "subscription")));
                    return;
                }
            };

            let first = next_block.unwrap_or(latest);
            for block_number in first..=latest {
                if sender.send(block_number).await.is_err() {
                    return;
                }
            }
            if latest >= first {
                next_block = Some(latest + 1);
            }
        }
    });

    (receiver, handle)
}
