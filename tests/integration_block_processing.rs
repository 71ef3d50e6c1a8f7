use address_watch::blockchain::{Block, BlockProcessor, BlockTransaction, ChainDataSource, ChainMonitor};
use address_watch::config::MonitorConfig;
use address_watch::error::{Result, RpcError};
use address_watch::models::{AddressRegistry, MatchReason, Report, Transaction, TransferType};
use address_watch::sink::MemorySink;
use alloy_primitives::U256;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const WATCHED: &str = "0x29772ce1cb7c1cefcae07fa7f03dc7d2de8cba83";
const OTHER: &str = "0xdeaddeaddeaddeaddeaddeaddeaddeaddeaddead";
const TOKEN: &str = "0x5c95260ebd1dd21547528e73dc601d74b2793e0d";

/// In-memory chain. Hashes listed in `failing` cannot be fetched; hashes in
/// `stalled` never answer.
#[derive(Default)]
struct MockChain {
    head: AtomicU64,
    blocks: HashMap<u64, Block>,
    transactions: HashMap<String, Transaction>,
    failing: HashSet<String>,
    stalled: HashSet<String>,
}

#[async_trait]
impl ChainDataSource for MockChain {
    async fn latest_block_number(&self) -> Result<u64> {
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn get_block(&self, block_number: u64) -> Result<Block> {
        self.blocks
            .get(&block_number)
            .cloned()
            .ok_or_else(|| RpcError::BlockNotFound { block_number }.into())
    }

    async fn get_transaction(&self, hash: &str) -> Result<Transaction> {
        if self.stalled.contains(hash) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.failing.contains(hash) {
            return Err(RpcError::Connection("connection reset".to_string()).into());
        }
        self.transactions
            .get(hash)
            .cloned()
            .ok_or_else(|| RpcError::TransactionNotFound { hash: hash.to_string() }.into())
    }
}

fn native_to(hash: &str, to: &str) -> Transaction {
    Transaction::new(hash, OTHER, Some(to), U256::from(1_000_000_000_000_000u64), "0x")
}

fn token_transfer_to(hash: &str, recipient: &str) -> Transaction {
    let data = format!(
        "0xa9059cbb{:0>64}{:064x}",
        recipient.trim_start_matches("0x"),
        5_000_000u64
    );
    Transaction::new(hash, OTHER, Some(TOKEN), U256::ZERO, &data)
}

/// Ten hash-only transactions; even ones pay the watched address, the rest go elsewhere
fn ten_transaction_block(number: u64) -> MockChain {
    let mut chain = MockChain::default();
    let mut entries = Vec::new();

    for i in 0..10u64 {
        let hash = format!("0x{:064x}", number * 100 + i);
        let tx = if i % 2 == 0 {
            native_to(&hash, WATCHED)
        } else {
            native_to(&hash, OTHER)
        };
        chain.transactions.insert(hash.clone(), tx);
        entries.push(BlockTransaction::Hash(hash));
    }

    chain.blocks.insert(
        number,
        Block {
            number,
            hash: Some(format!("0x{:064x}", number)),
            timestamp: Some(1_700_000_000),
            transactions: entries,
        },
    );
    chain.head.store(number, Ordering::SeqCst);
    chain
}

fn processor(chain: MockChain, sink: Arc<MemorySink>, timeout: Duration) -> BlockProcessor {
    BlockProcessor::new(
        Arc::new(chain),
        Arc::new(AddressRegistry::new([WATCHED])),
        sink,
        timeout,
    )
}

#[tokio::test]
async fn test_one_failing_transaction_does_not_stop_its_block() {
    let mut chain = ten_transaction_block(500);
    for (hash, tx) in chain.transactions.iter_mut() {
        *tx = native_to(hash, WATCHED);
    }
    // transaction #4 cannot be fetched
    chain.failing.insert(format!("0x{:064x}", 500 * 100 + 4));

    let sink = Arc::new(MemorySink::new());
    let summary = processor(chain, sink.clone(), Duration::from_secs(5))
        .process_block(500)
        .await
        .expect("block should complete");

    assert_eq!(summary.block_number, 500);
    assert_eq!(summary.transaction_count, 10);
    assert_eq!(summary.failures, 1);
    assert_eq!(summary.matches, 9);
    assert_eq!(sink.len(), 9);

    for report in sink.reports() {
        match report {
            Report::Chain(found) => {
                assert_eq!(found.reason, MatchReason::DirectRecipient);
                assert_eq!(found.transfer_type, TransferType::NativeTransfer);
            }
            other => panic!("unexpected report: {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_stalled_fetch_times_out_without_blocking_siblings() {
    let mut chain = ten_transaction_block(600);
    chain.stalled.insert(format!("0x{:064x}", 600 * 100 + 2));

    let sink = Arc::new(MemorySink::new());
    let summary = processor(chain, sink.clone(), Duration::from_millis(100))
        .process_block(600)
        .await
        .unwrap();

    assert_eq!(summary.failures, 1);
    assert_eq!(summary.matches, 4);
}

#[tokio::test]
async fn test_token_transfer_to_watched_recipient_is_reported() {
    let mut chain = MockChain::default();
    let tx = token_transfer_to("0xt1", WATCHED);
    chain.blocks.insert(
        7,
        Block {
            number: 7,
            hash: None,
            timestamp: None,
            transactions: vec![BlockTransaction::Full(Box::new(tx))],
        },
    );

    let sink = Arc::new(MemorySink::new());
    let summary = processor(chain, sink.clone(), Duration::from_secs(1))
        .process_block(7)
        .await
        .unwrap();

    assert_eq!(summary.matches, 1);
    match sink.reports().as_slice() {
        [Report::Chain(found)] => {
            assert_eq!(found.reason, MatchReason::TokenRecipient);
            assert_eq!(found.transfer_type, TransferType::TokenTransfer);
            assert_eq!(found.watched_address, WATCHED);
            assert_eq!(found.decoded.as_ref().unwrap().amount(), U256::from(5_000_000u64));
        }
        other => panic!("unexpected reports: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_block_is_an_error() {
    let sink = Arc::new(MemorySink::new());
    let result = processor(MockChain::default(), sink.clone(), Duration::from_secs(1))
        .process_block(42)
        .await;

    assert!(result.is_err());
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_monitor_processes_head_block_then_stops_on_shutdown() {
    let chain = Arc::new(ten_transaction_block(900));
    let sink = Arc::new(MemorySink::new());
    let config = MonitorConfig {
        poll_interval_seconds: 1,
        max_concurrent_blocks: 2,
        tx_fetch_timeout_seconds: 5,
    };

    let monitor = Arc::new(
        ChainMonitor::new(
            chain,
            Arc::new(AddressRegistry::new([WATCHED])),
            sink.clone(),
            &config,
        )
        .with_poll_interval(Duration::from_millis(20)),
    );

    let running = {
        let monitor = Arc::clone(&monitor);
        tokio::spawn(async move { monitor.run().await })
    };

    tokio::time::sleep(Duration::from_millis(300)).await;
    monitor.shutdown();

    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("monitor should stop after shutdown")
        .unwrap()
        .unwrap();

    let status = monitor.status();
    assert!(!status.is_running);
    assert_eq!(status.last_block_seen, 900);
    assert_eq!(status.blocks_processed, 1);
    assert_eq!(status.matches_reported, 5);
    assert_eq!(sink.len(), 5);
}
