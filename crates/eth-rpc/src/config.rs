//! Probe configuration.
//!
//! Loaded from a TOML file; every field has a default so a file only needs
//! to name what differs from a local development node.

use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy_primitives::Address;
use chain_eth::hash::decode_hex;
use chain_eth::wallet::Wallet;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RpcError};
use crate::receipt::RetryPolicy;

/// Environment variable read for the signing key unless configured otherwise.
pub const DEFAULT_PRIVATE_KEY_ENV: &str = "ETH_PROBE_PRIVATE_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// JSON-RPC HTTP endpoint
    pub http_url: String,
    /// WebSocket endpoint for subscriptions
    pub ws_url: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Expected chain id; checked by callers that care
    pub chain_id: Option<u64>,
    pub receipt: ReceiptConfig,
    /// Name of the environment variable holding the private key
    pub private_key_env: String,
    /// Hex file with the compiled Store bytecode
    pub store_bytecode_path: Option<PathBuf>,
    /// Already deployed Store contract
    pub store_address: Option<Address>,
    /// ERC-20 token used by the token workflows
    pub token_address: Option<Address>,
    /// Contracts whose logs are watched or scanned
    pub watch_addresses: Vec<Address>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            http_url: "http://127.0.0.1:8545".to_string(),
            ws_url: None,
            request_timeout_secs: 10,
            chain_id: None,
            receipt: ReceiptConfig::default(),
            private_key_env: DEFAULT_PRIVATE_KEY_ENV.to_string(),
            store_bytecode_path: None,
            store_address: None,
            token_address: None,
            watch_addresses: Vec::new(),
        }
    }
}

/// Receipt polling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
    pub backoff_multiplier: f64,
    pub max_interval_ms: u64,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval_ms: 1_000,
            backoff_multiplier: 1.0,
            max_interval_ms: 1_000,
        }
    }
}

impl From<&ReceiptConfig> for RetryPolicy {
    fn from(config: &ReceiptConfig) -> Self {
        RetryPolicy {
            max_attempts: config.max_attempts,
            interval: Duration::from_millis(config.interval_ms),
            backoff_multiplier: config.backoff_multiplier,
            max_interval: Duration::from_millis(config.max_interval_ms),
        }
    }
}

impl ProbeConfig {
    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RpcError::Config(format!("failed to read '{}': {e}", path.display())))?;
        Self::from_toml_str(&contents)
            .map_err(|e| RpcError::Config(format!("'{}': {e}", path.display())))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ProbeConfig =
            toml::from_str(contents).map_err(|e| RpcError::Config(format!("invalid toml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.http_url.starts_with("http://") || self.http_url.starts_with("https://")) {
            return Err(RpcError::Config(format!("http_url must be http(s): {:?}", self.http_url)));
        }

        if let Some(ws) = &self.ws_url {
            if !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
                return Err(RpcError::Config(format!("ws_url must be ws(s): {ws:?}")));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(RpcError::Config("request_timeout_secs cannot be 0".into()));
        }

        if self.receipt.max_attempts == 0 {
            return Err(RpcError::Config("receipt.max_attempts cannot be 0".into()));
        }

        if !self.receipt.backoff_multiplier.is_finite() || self.receipt.backoff_multiplier < 1.0 {
            return Err(RpcError::Config(format!(
                "receipt.backoff_multiplier must be at least 1.0, got {}",
                self.receipt.backoff_multiplier
            )));
        }

        if self.private_key_env.is_empty() {
            return Err(RpcError::Config("private_key_env cannot be empty".into()));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.receipt)
    }

    /// The signing key from the configured environment variable.
    pub fn private_key(&self) -> Result<SecretString> {
        std::env::var(&self.private_key_env)
            .map(SecretString::from)
            .map_err(|_| RpcError::Config(format!("environment variable {} is not set", self.private_key_env)))
    }

    pub fn wallet(&self) -> Result<Wallet> {
        let key = self.private_key()?;
        Ok(Wallet::from_hex(key.expose_secret())?)
    }

    /// Store init bytecode read from `store_bytecode_path`.
    pub fn store_bytecode(&self) -> Result<Vec<u8>> {
        let path = self
            .store_bytecode_path
            .as_ref()
            .ok_or_else(|| RpcError::Config("store_bytecode_path is not set".into()))?;
        let text = std::fs::read_to_string(path)
            .map_err(|e| RpcError::Config(format!("failed to read '{}': {e}", path.display())))?;
        Ok(decode_hex(text.trim())?)
    }
}
