use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use super::data_source::{Block, BlockTransaction, ChainDataSource};
use crate::config::RpcConfig;
use crate::error::{ProcessingError, RpcError, WatcherError};
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{parse_u256, Transaction};
use crate::retry::{RetryConfig, RetryUtils};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a [Value],
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// `eth_getBlockByNumber` result
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlock {
    number: Option<String>,
    hash: Option<String>,
    timestamp: Option<String>,
    /// Kept raw so that one bad entry cannot fail the block
    #[serde(default)]
    transactions: Vec<Value>,
}

/// Transaction object in JSON-RPC wire form, quantities hex-encoded
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransaction {
    hash: String,
    from: String,
    to: Option<String>,
    value: Option<String>,
    #[serde(default, alias = "data")]
    input: Option<String>,
    block_number: Option<String>,
    block_hash: Option<String>,
    nonce: Option<String>,
    transaction_index: Option<String>,
    gas: Option<String>,
    gas_price: Option<String>,
    max_fee_per_gas: Option<String>,
    max_priority_fee_per_gas: Option<String>,
    chain_id: Option<String>,
}

impl TryFrom<RpcTransaction> for Transaction {
    type Error = ProcessingError;

    fn try_from(raw: RpcTransaction) -> Result<Self, Self::Error> {
        let quantity = |field: &str, value: Option<&String>| match value {
            Some(v) => parse_u256(v).map(Some).ok_or_else(|| {
                ProcessingError::TransactionParsing(format!("invalid {} '{}' in {}", field, v, raw.hash))
            }),
            None => Ok(None),
        };
        let number = |field: &str, value: Option<&String>| match value {
            Some(v) => parse_hex_to_u64(v).map(Some).map_err(|_| {
                ProcessingError::TransactionParsing(format!("invalid {} '{}' in {}", field, v, raw.hash))
            }),
            None => Ok(None),
        };

        let value = quantity("value", raw.value.as_ref())?.unwrap_or_default();
        let gas_limit = quantity("gas", raw.gas.as_ref())?.unwrap_or_default();
        let gas_price = quantity("gasPrice", raw.gas_price.as_ref())?;
        let max_fee_per_gas = quantity("maxFeePerGas", raw.max_fee_per_gas.as_ref())?;
        let max_priority_fee_per_gas =
            quantity("maxPriorityFeePerGas", raw.max_priority_fee_per_gas.as_ref())?;
        let block_number = number("blockNumber", raw.block_number.as_ref())?;
        let nonce = number("nonce", raw.nonce.as_ref())?.unwrap_or_default();
        let index = number("transactionIndex", raw.transaction_index.as_ref())?;
        let chain_id = number("chainId", raw.chain_id.as_ref())?;

        let data = match raw.input {
            Some(input) if !input.is_empty() => input,
            _ => "0x".to_string(),
        };

        Ok(Transaction {
            hash: raw.hash,
            from: raw.from,
            to: raw.to,
            value,
            data,
            block_number,
            block_hash: raw.block_hash,
            nonce,
            index,
            gas_limit,
            gas_price,
            max_fee_per_gas,
            max_priority_fee_per_gas,
            chain_id,
        })
    }
}

impl RpcBlock {
    fn into_block(self, requested: u64) -> Result<Block, ProcessingError> {
        let number = match self.number.as_deref() {
            Some(n) => parse_hex_to_u64(n)
                .map_err(|e| ProcessingError::BlockParsing(format!("block {}: {}", requested, e)))?,
            None => requested,
        };
        let timestamp = self.timestamp.as_deref().and_then(|t| parse_hex_to_u64(t).ok());

        let transactions = self
            .transactions
            .into_iter()
            .enumerate()
            .map(|(index, entry)| block_entry(number, index, entry))
            .collect();

        Ok(Block {
            number,
            hash: self.hash,
            timestamp,
            transactions,
        })
    }
}

/// Convert one `transactions` entry. Failures become `Malformed` entries.
fn block_entry(block_number: u64, index: usize, entry: Value) -> BlockTransaction {
    if let Value::String(hash) = entry {
        return BlockTransaction::Hash(hash);
    }

    let hash = entry
        .get("hash")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("block {} entry {}", block_number, index));

    let converted = serde_json::from_value::<RpcTransaction>(entry)
        .map_err(|e| e.to_string())
        .and_then(|raw| Transaction::try_from(raw).map_err(|e| e.to_string()));

    match converted {
        Ok(tx) => BlockTransaction::Full(Box::new(tx)),
        Err(reason) => BlockTransaction::Malformed { hash, reason },
    }
}

/// JSON-RPC over HTTP chain data source
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
    retry: RetryConfig,
}

impl RpcClient {
    pub fn new(endpoint: String) -> Result<Self, WatcherError> {
        Self::from_config(&RpcConfig {
            endpoint,
            ..RpcConfig::default()
        })
    }

    /// Client with timeout, connection pooling and retry settings from configuration
    pub fn from_config(config: &RpcConfig) -> Result<Self, WatcherError> {
        let context = LogContext::new("rpc_client", "initialization")
            .with_metadata("endpoint", json!(config.endpoint))
            .with_metadata("timeout_seconds", json!(config.timeout_seconds))
            .with_metadata("max_retries", json!(config.max_retries));
        context.info("Initializing RPC client");

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(RpcError::Http)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            timeout_seconds: config.timeout_seconds,
            retry: RetryConfig::for_rpc().with_max_attempts(config.max_retries),
        })
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn make_request(&self, method: &str, params: &[Value]) -> Result<Value, WatcherError> {
        let context = LogContext::new("rpc_client", "make_request")
            .with_metadata("method", json!(method))
            .with_metadata("endpoint", json!(self.endpoint));

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        context.trace(&format!("Sending RPC request: {}", method));

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RpcError::Timeout { seconds: self.timeout_seconds }
                } else if e.is_connect() {
                    RpcError::Connection(e.to_string())
                } else {
                    RpcError::Http(e)
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let seconds = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(1);
            return Err(RpcError::RateLimit { seconds }.into());
        }
        if !status.is_success() {
            let error_msg = format!(
                "HTTP error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            );
            return Err(RpcError::Connection(error_msg).into());
        }

        let body = response.text().await.map_err(RpcError::Http)?;
        let rpc_response: JsonRpcResponse = serde_json::from_str(&body).map_err(RpcError::Json)?;

        if let Some(error) = rpc_response.error {
            let rpc_error = match error.code {
                -32700 => RpcError::InvalidResponse("Parse error".to_string()),
                -32600 => RpcError::InvalidResponse("Invalid request".to_string()),
                -32602 => RpcError::InvalidResponse("Invalid params".to_string()),
                _ => RpcError::Method { code: error.code, message: error.message },
            };
            return Err(rpc_error.into());
        }

        // A missing result is not an error: eth_getBlockByNumber and friends answer null
        Ok(rpc_response.result.unwrap_or(Value::Null))
    }

    /// One JSON-RPC call with retry, timing and metrics. `check` runs inside the
    /// retry loop, so a recoverable error it returns is retried too.
    async fn call<T, C>(&self, method: &str, params: Vec<Value>, check: C) -> Result<T, WatcherError>
    where
        C: Fn(Value) -> Result<T, WatcherError>,
    {
        let params = params.as_slice();
        let check = &check;
        RetryUtils::retry_with_config(method, self.retry.clone(), || async move {
            let monitor = PerformanceMonitor::new(&format!("rpc_{}", method));
            let result = self.make_request(method, params).await.and_then(check);
            let duration = monitor.finish_with_result(&result);
            MetricsLogger::log_rpc_call(method, duration, result.is_ok());
            result
        })
        .await
    }

    pub async fn get_latest_block_number(&self) -> Result<u64, WatcherError> {
        let block_number = self
            .call("eth_blockNumber", vec![], |value| {
                let hex_string = value.as_str().ok_or_else(|| {
                    RpcError::InvalidResponse("Block number is not a string".to_string())
                })?;
                parse_hex_to_u64(hex_string).map_err(|e| {
                    ProcessingError::BlockParsing(format!("Failed to parse block number: {}", e)).into()
                })
            })
            .await?;

        LogContext::new("rpc_client", "get_latest_block_number")
            .with_block_number(block_number)
            .debug(&format!("Retrieved latest block number: {}", block_number));

        Ok(block_number)
    }

    /// Block with full transaction objects
    pub async fn get_block(&self, block_number: u64) -> Result<Block, WatcherError> {
        let params = vec![json!(format!("0x{:x}", block_number)), json!(true)];

        // A fresh block may not be visible yet on every node behind the endpoint
        let value = self
            .call("eth_getBlockByNumber", params, |value| {
                if value.is_null() {
                    return Err(RpcError::BlockNotFound { block_number }.into());
                }
                Ok(value)
            })
            .await?;

        let raw: RpcBlock = serde_json::from_value(value).map_err(|e| {
            ProcessingError::BlockParsing(format!("Failed to parse block {}: {}", block_number, e))
        })?;
        let block = raw.into_block(block_number)?;

        LogContext::new("rpc_client", "get_block")
            .with_block_number(block_number)
            .with_metadata("transaction_count", json!(block.transactions.len()))
            .debug(&format!("Retrieved block {} with {} transactions",
                block_number, block.transactions.len()));

        Ok(block)
    }

    pub async fn get_transaction(&self, hash: &str) -> Result<Transaction, WatcherError> {
        let value = self
            .call("eth_getTransactionByHash", vec![json!(hash)], |value| {
                if value.is_null() {
                    return Err(RpcError::TransactionNotFound { hash: hash.to_string() }.into());
                }
                Ok(value)
            })
            .await?;

        let raw: RpcTransaction = serde_json::from_value(value).map_err(|e| {
            ProcessingError::TransactionParsing(format!("Failed to parse transaction {}: {}", hash, e))
        })?;

        Ok(Transaction::try_from(raw)?)
    }
}

#[async_trait]
impl ChainDataSource for RpcClient {
    async fn latest_block_number(&self) -> Result<u64, WatcherError> {
        self.get_latest_block_number().await
    }

    async fn get_block(&self, block_number: u64) -> Result<Block, WatcherError> {
        RpcClient::get_block(self, block_number).await
    }

    async fn get_transaction(&self, hash: &str) -> Result<Transaction, WatcherError> {
        RpcClient::get_transaction(self, hash).await
    }
}

fn parse_hex_to_u64(hex_str: &str) -> Result<u64, std::num::ParseIntError> {
    let hex_without_prefix = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    u64::from_str_radix(hex_without_prefix, 16)
}
