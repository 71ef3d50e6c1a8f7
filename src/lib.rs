pub mod blockchain;
pub mod models;
pub mod api;
pub mod error;
pub mod logging;
pub mod retry;
pub mod config;
pub mod sink;
pub mod webhook;

pub use blockchain::{ChainDataSource, ChainMonitor, RpcClient};
pub use error::{WatcherError, Result};
pub use logging::{LogContext, PerformanceMonitor, ErrorLogger, MetricsLogger};
pub use retry::{RetryManager, RetryConfig, RetryUtils};
pub use config::{AppConfig, RpcConfig, MonitorConfig, WebhookConfig, ExplorerConfig, LoggingConfig};
pub use sink::{LogSink, MemorySink, ReportSink};
pub use webhook::WebhookIngestor;
