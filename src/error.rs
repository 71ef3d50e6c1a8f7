use thiserror::Error;

/// Main error type for the address watcher
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

/// RPC-related errors
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC method error: code={code}, message={message}")]
    Method { code: i32, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Rate limit exceeded, retry after {seconds} seconds")]
    RateLimit { seconds: u64 },

    #[error("Block not found: {block_number}")]
    BlockNotFound { block_number: u64 },

    #[error("Transaction not found: {hash}")]
    TransactionNotFound { hash: String },

    #[error("Connection failed: {0}")]
    Connection(String),
}

/// Block and transaction processing errors
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Block parsing failed: {0}")]
    BlockParsing(String),

    #[error("Transaction parsing failed: {0}")]
    TransactionParsing(String),

    #[error("Transaction fetch timed out after {seconds}s: {hash}")]
    FetchTimeout { hash: String, seconds: u64 },

    #[error("Transaction task aborted: {0}")]
    TaskAborted(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Webhook ingestion faults. A payload with an unrecognized shape is not an error.
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Malformed JSON body: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("Failed to forward notification: {0}")]
    Forward(#[from] SinkError),
}

/// Reporting sink errors
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Report serialization failed: {0}")]
    Serialization(String),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Errors that stop the process from doing useful work
    Critical,
    /// Errors that affect functionality
    High,
    /// Errors that affect a single unit of work
    Medium,
    /// Mostly informational
    Low,
}

impl WatcherError {
    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            WatcherError::Config(_) => ErrorSeverity::Critical,

            WatcherError::Rpc(RpcError::Connection(_)) => ErrorSeverity::High,
            WatcherError::Sink(_) => ErrorSeverity::High,
            WatcherError::Webhook(WebhookError::Forward(_)) => ErrorSeverity::High,

            WatcherError::Rpc(RpcError::Timeout { .. }) => ErrorSeverity::Medium,
            WatcherError::Rpc(RpcError::RateLimit { .. }) => ErrorSeverity::Medium,
            WatcherError::Processing(_) => ErrorSeverity::Medium,

            WatcherError::Rpc(RpcError::BlockNotFound { .. }) => ErrorSeverity::Low,
            WatcherError::Rpc(RpcError::TransactionNotFound { .. }) => ErrorSeverity::Low,
            WatcherError::Webhook(WebhookError::MalformedJson(_)) => ErrorSeverity::Low,
            _ => ErrorSeverity::Medium,
        }
    }

    /// Check if the error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            WatcherError::Rpc(RpcError::Timeout { .. }) => true,
            WatcherError::Rpc(RpcError::RateLimit { .. }) => true,
            WatcherError::Rpc(RpcError::Connection(_)) => true,
            WatcherError::Rpc(RpcError::Http(e)) => e.is_timeout() || e.is_connect(),
            // Freshly mined blocks can lag behind eth_blockNumber on load-balanced nodes
            WatcherError::Rpc(RpcError::BlockNotFound { .. }) => true,

            WatcherError::Config(_) => false,
            WatcherError::Webhook(_) => false,
            _ => false,
        }
    }

    /// Get suggested retry delay in seconds for recoverable errors
    pub fn retry_delay(&self) -> Option<u64> {
        if !self.is_recoverable() {
            return None;
        }

        match self {
            WatcherError::Rpc(RpcError::RateLimit { seconds }) => Some(*seconds),
            WatcherError::Rpc(RpcError::Timeout { .. }) => Some(5),
            WatcherError::Rpc(RpcError::Connection(_)) => Some(10),
            WatcherError::Rpc(RpcError::BlockNotFound { .. }) => Some(1),
            _ => Some(5),
        }
    }
}
