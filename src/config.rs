use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::models::{validate_address, AddressRegistry, TokenCatalog, TokenCatalogEntry};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Addresses reported on by both the chain monitor and the webhook ingestor
    pub watched_addresses: Vec<String>,
    pub rpc: RpcConfig,
    pub monitor: MonitorConfig,
    pub webhook: WebhookConfig,
    pub explorer: ExplorerConfig,
    pub logging: LoggingConfig,
    /// Known token contracts, used to name webhook assets
    pub tokens: Vec<TokenCatalogEntry>,
}

/// RPC client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum number of attempts per call
    pub max_retries: u32,
}

/// Chain monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Latest-block polling interval in seconds
    pub poll_interval_seconds: u64,
    /// Blocks that may be processed at the same time
    pub max_concurrent_blocks: usize,
    /// Upper bound on a single transaction fetch, in seconds
    pub tx_fetch_timeout_seconds: u64,
}

/// Webhook server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Start the webhook server alongside the monitor
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

/// Block explorer links for webhook records
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub mainnet_url: String,
    pub sepolia_url: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            watched_addresses: vec![
                "0x2C57E373624D66B7a2E000A91E12ED6B865D57BA".to_string(),
                "0xE90ACFD806d52c857AD0a2705D49A4F846ACfDAE".to_string(),
                "0xB3988b8a447C154112D7D58119eB4f5Ec2193669".to_string(),
                "0x0f95B9495423589b6fD5aEf958C873b629C4B788".to_string(),
                "0x29772ce1cb7c1cefcae07fa7f03dc7d2de8cba83".to_string(),
            ],
            rpc: RpcConfig::default(),
            monitor: MonitorConfig::default(),
            webhook: WebhookConfig::default(),
            explorer: ExplorerConfig::default(),
            logging: LoggingConfig::default(),
            tokens: vec![
                TokenCatalogEntry::new(
                    "ethereum-sepolia",
                    "USDT",
                    "0x5C95260eBD1dD21547528E73dc601d74B2793e0D",
                ),
                TokenCatalogEntry::new(
                    "ethereum-sepolia",
                    "USDC",
                    "0x387d687B9574E93aCCEF1c272ce0D77381305eC3",
                ),
            ],
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 4,
            max_concurrent_blocks: 4,
            tx_fetch_timeout_seconds: 10,
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            mainnet_url: "https://etherscan.io/tx/".to_string(),
            sepolia_url: "https://sepolia.etherscan.io/tx/".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    /// Environment variables take precedence over file values
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the TOML file named by CONFIG_FILE; a missing file yields defaults
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ConfigError::FileNotFound(config_path.clone()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // RPC configuration
        if let Ok(endpoint) = env::var("RPC_URL") {
            self.rpc.endpoint = endpoint;
        }
        if let Some(timeout) = parse_env("RPC_TIMEOUT_SECONDS")? {
            self.rpc.timeout_seconds = timeout;
        }
        if let Some(retries) = parse_env("RPC_MAX_RETRIES")? {
            self.rpc.max_retries = retries;
        }

        // Monitor configuration
        if let Some(interval) = parse_env("POLL_INTERVAL_SECONDS")? {
            self.monitor.poll_interval_seconds = interval;
        }
        if let Some(max_blocks) = parse_env("MAX_CONCURRENT_BLOCKS")? {
            self.monitor.max_concurrent_blocks = max_blocks;
        }
        if let Some(timeout) = parse_env("TX_FETCH_TIMEOUT_SECONDS")? {
            self.monitor.tx_fetch_timeout_seconds = timeout;
        }

        if let Ok(addresses) = env::var("WATCHED_ADDRESSES") {
            self.watched_addresses = addresses
                .split(',')
                .map(str::trim)
                .filter(|address| !address.is_empty())
                .map(str::to_string)
                .collect();
        }

        // Webhook configuration
        if let Some(enabled) = parse_env("WEBHOOK_ENABLED")? {
            self.webhook.enabled = enabled;
        }
        if let Ok(host) = env::var("WEBHOOK_HOST") {
            self.webhook.host = host;
        }
        if let Some(port) = parse_env("WEBHOOK_PORT")? {
            self.webhook.port = port;
        }

        // Logging configuration
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        for url in [&self.rpc.endpoint, &self.explorer.mainnet_url, &self.explorer.sepolia_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }

        check_range("rpc.timeout_seconds", self.rpc.timeout_seconds, 1, 300)?;
        check_range("rpc.max_retries", self.rpc.max_retries as u64, 1, 20)?;
        check_range("monitor.poll_interval_seconds", self.monitor.poll_interval_seconds, 1, 300)?;
        check_range("monitor.max_concurrent_blocks", self.monitor.max_concurrent_blocks as u64, 1, 64)?;
        check_range("monitor.tx_fetch_timeout_seconds", self.monitor.tx_fetch_timeout_seconds, 1, 300)?;

        if self.webhook.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "webhook.port".to_string(),
                value: self.webhook.port.to_string(),
            });
        }

        for address in &self.watched_addresses {
            validate_address(address)?;
        }
        for token in &self.tokens {
            validate_address(&token.contract_address)?;
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: self.logging.format.clone(),
            });
        }

        Ok(())
    }

    /// Build the watched-address registry
    pub fn registry(&self) -> Result<AddressRegistry, ConfigError> {
        AddressRegistry::from_config(&self.watched_addresses)
    }

    /// Build the token catalog
    pub fn token_catalog(&self) -> TokenCatalog {
        TokenCatalog::new(self.tokens.clone())
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        let config = Self::default();
        toml::to_string_pretty(&config)
            .map_err(|e| ConfigError::Parsing(e.to_string()))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

fn check_range(key: &str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}
