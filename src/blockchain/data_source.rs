use async_trait::async_trait;

use crate::error::Result;
use crate::models::Transaction;

/// A block as returned by the chain data source
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub number: u64,
    pub hash: Option<String>,
    pub timestamp: Option<u64>,
    pub transactions: Vec<BlockTransaction>,
}

/// A block body entry. Providers may return full objects or only hashes.
///
/// An entry the source could not turn into a transaction is kept as
/// `Malformed` so that it fails on its own instead of failing the block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockTransaction {
    Hash(String),
    Full(Box<Transaction>),
    Malformed { hash: String, reason: String },
}

impl BlockTransaction {
    pub fn hash(&self) -> &str {
        match self {
            BlockTransaction::Hash(hash) => hash,
            BlockTransaction::Full(tx) => &tx.hash,
            BlockTransaction::Malformed { hash, .. } => hash,
        }
    }
}

impl Block {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Where the chain monitor reads blocks and transactions from
#[async_trait]
pub trait ChainDataSource: Send + Sync {
    /// Number of the newest block the source knows about
    async fn latest_block_number(&self) -> Result<u64>;

    /// Block with its transaction bodies
    async fn get_block(&self, block_number: u64) -> Result<Block>;

    async fn get_transaction(&self, hash: &str) -> Result<Transaction>;
}
