pub mod data_source;
pub mod rpc_client;
pub mod transfer_classifier;
pub mod abi_decoder;
pub mod block_processor;
pub mod chain_monitor;

pub use data_source::{Block, BlockTransaction, ChainDataSource};
pub use rpc_client::RpcClient;
pub use transfer_classifier::classify;
pub use abi_decoder::{decode, decode_transfer, decode_transfer_from, CallLayout, DECODE_TABLE};
pub use block_processor::{match_transaction, BlockProcessor, BlockSummary};
pub use chain_monitor::{spawn_block_subscription, ChainMonitor, MonitorStatus};
