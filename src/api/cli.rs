use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::api::http::{ApiError, WebhookServer};
use crate::blockchain::{abi_decoder, transfer_classifier, ChainDataSource, ChainMonitor, RpcClient};
use crate::config::AppConfig;
use crate::error::{ConfigError, WatcherError};
use crate::models::{format_ether, parse_u256, validate_address, DecodedCall, Transaction, TransferType};
use crate::sink::{LogSink, ReportSink};
use crate::webhook::WebhookIngestor;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("CLI operation failed: {0}")]
    Operation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Watcher(#[from] WatcherError),

    #[error(transparent)]
    Server(#[from] ApiError),
}

#[derive(Parser, Debug)]
#[command(name = "watcher")]
#[command(about = "Watch EVM addresses for incoming transfers, on-chain and via webhook")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Follow new blocks on the configured RPC endpoint
    Monitor,

    /// Run the webhook receiver only
    Serve {
        /// Listen port (defaults to the configured webhook port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run the block monitor and the webhook receiver together
    Run,

    /// Classify a single transaction offline
    Classify {
        /// Calldata as 0x-prefixed hex
        #[arg(long)]
        data: String,

        /// Value in wei
        #[arg(long, default_value = "0")]
        value: String,

        /// Recipient address; omit for contract creation
        #[arg(long)]
        to: Option<String>,
    },

    /// List the watched addresses
    Watched,

    /// Print a configuration file with every default filled in
    SampleConfig,
}

/// Result of `watcher classify`
#[derive(Debug, Serialize, PartialEq)]
pub struct Classification {
    pub transfer_type: TransferType,
    pub label: &'static str,
    pub value_ether: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded: Option<DecodedCall>,
}

/// Classify and decode calldata without touching the network
pub fn classify_calldata(data: &str, value: &str, to: Option<&str>) -> Result<Classification, CliError> {
    let value = parse_u256(value)
        .ok_or_else(|| CliError::InvalidArgument(format!("value is not a number: {}", value)))?;
    if let Some(to) = to {
        validate_address(to).map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    }

    let tx = Transaction::new("0x0", "0x0000000000000000000000000000000000000000", to, value, data);
    let transfer_type = transfer_classifier::classify(&tx);

    let decoded = match transfer_type {
        TransferType::TokenTransfer | TransferType::TokenTransferFrom => abi_decoder::decode(&tx),
        _ => None,
    };

    Ok(Classification {
        transfer_type,
        label: transfer_type.label(),
        value_ether: format_ether(value),
        decoded,
    })
}

pub struct CliHandler {
    config: AppConfig,
    sink: Arc<dyn ReportSink>,
}

impl CliHandler {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            sink: Arc::new(LogSink),
        }
    }

    pub async fn execute_command(&self, command: &Commands) -> Result<(), CliError> {
        match command {
            Commands::Monitor => self.monitor().await,
            Commands::Serve { port } => self.serve(*port).await,
            Commands::Run => self.run().await,
            Commands::Classify { data, value, to } => {
                let classification = classify_calldata(data, value, to.as_deref())?;
                let output = serde_json::to_string_pretty(&classification)
                    .map_err(|e| CliError::Operation(e.to_string()))?;
                println!("{}", output);
                Ok(())
            }
            Commands::Watched => {
                let registry = self.config.registry()?;
                println!("Watching {} addresses:", registry.len());
                for address in registry.addresses() {
                    println!("  {}", address);
                }
                Ok(())
            }
            Commands::SampleConfig => {
                println!("{}", AppConfig::generate_sample_config()?);
                Ok(())
            }
        }
    }

    fn chain_monitor(&self) -> Result<ChainMonitor, CliError> {
        let source: Arc<dyn ChainDataSource> = Arc::new(RpcClient::from_config(&self.config.rpc)?);
        let registry = Arc::new(self.config.registry()?);

        Ok(ChainMonitor::new(
            source,
            registry,
            Arc::clone(&self.sink),
            &self.config.monitor,
        ))
    }

    fn webhook_server(&self, port: Option<u16>) -> WebhookServer {
        let ingestor = WebhookIngestor::new(
            Arc::new(self.config.token_catalog()),
            self.config.explorer.clone(),
            Arc::clone(&self.sink),
        );
        WebhookServer::new(
            Arc::new(ingestor),
            &self.config.webhook.host,
            port.unwrap_or(self.config.webhook.port),
        )
    }

    async fn monitor(&self) -> Result<(), CliError> {
        self.chain_monitor()?.start().await?;
        Ok(())
    }

    async fn serve(&self, port: Option<u16>) -> Result<(), CliError> {
        self.webhook_server(port).start().await?;
        Ok(())
    }

    /// Both ingestion paths; the first one to stop ends the run
    async fn run(&self) -> Result<(), CliError> {
        let monitor = self.chain_monitor()?;

        if !self.config.webhook.enabled {
            log::info!("Webhook receiver disabled by configuration");
            monitor.start().await?;
            return Ok(());
        }

        let server = self.webhook_server(None);
        tokio::select! {
            result = monitor.start() => result?,
            result = server.start() => result?,
        }

        Ok(())
    }
}
