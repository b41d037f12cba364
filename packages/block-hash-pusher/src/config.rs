//! Pusher configuration

use alloy::primitives::Address;
use eyre::{eyre, Result};
use retryables_rs::evm::EvmClientConfig;
use retryables_rs::redact::Redacted;
use std::env;
use std::time::Duration;

/// Default interval between child chain polls while waiting for the ticket
pub const DEFAULT_MESSAGE_POLL_INTERVAL_MS: u64 = 1000;

/// Pusher configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Parent chain RPC URL
    pub parent_rpc_url: String,
    /// Child chain RPC URL
    pub child_rpc_url: String,
    /// Parent chain key, sends the push (and the fee token approval)
    pub parent_private_key: Redacted<String>,
    /// Child chain key, sends manual redeems
    pub child_private_key: Redacted<String>,
    /// Pusher contract on the parent chain
    pub pusher_address: Address,

    /// Poll interval while waiting for the retryable ticket, in milliseconds
    pub message_poll_interval_ms: u64,
    /// Give up waiting for the retryable ticket after this many seconds,
    /// instead of the child network's deposit timeout
    pub message_timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from environment
    pub fn load() -> Result<Self> {
        // Try to load .env file
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded .env from {:?}", path);
        }

        Self::from_env()
    }

    /// Read configuration from the process environment only
    pub fn from_env() -> Result<Self> {
        let pusher_address: Address = env::var("PUSHER_ADDRESS")
            .map_err(|_| eyre!("PUSHER_ADDRESS required"))?
            .trim()
            .parse()
            .map_err(|e| eyre!("Invalid PUSHER_ADDRESS: {}", e))?;

        let message_poll_interval_ms = match env::var("MESSAGE_POLL_INTERVAL_MS") {
            Ok(v) => match v.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => return Err(eyre!("Invalid MESSAGE_POLL_INTERVAL_MS: {}", v)),
            },
            Err(_) => DEFAULT_MESSAGE_POLL_INTERVAL_MS,
        };

        let message_timeout_secs = match env::var("MESSAGE_TIMEOUT_SECS") {
            Ok(v) => Some(
                v.trim()
                    .parse()
                    .map_err(|_| eyre!("Invalid MESSAGE_TIMEOUT_SECS: {}", v))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            parent_rpc_url: env::var("PARENT_RPC_URL")
                .map_err(|_| eyre!("PARENT_RPC_URL required"))?,
            child_rpc_url: env::var("CHILD_RPC_URL")
                .map_err(|_| eyre!("CHILD_RPC_URL required"))?,
            parent_private_key: env::var("PARENT_PRIVATE_KEY")
                .map_err(|_| eyre!("PARENT_PRIVATE_KEY required"))?
                .into(),
            child_private_key: env::var("CHILD_PRIVATE_KEY")
                .map_err(|_| eyre!("CHILD_PRIVATE_KEY required"))?
                .into(),
            pusher_address,

            message_poll_interval_ms,
            message_timeout_secs,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.message_poll_interval_ms)
    }

    pub fn message_timeout(&self) -> Option<Duration> {
        self.message_timeout_secs.map(Duration::from_secs)
    }

    /// Client settings for the parent chain signer
    pub fn parent_client(&self) -> EvmClientConfig {
        EvmClientConfig {
            rpc_url: self.parent_rpc_url.clone(),
            private_key: self.parent_private_key.clone(),
        }
    }

    /// Client settings for the child chain signer
    pub fn child_client(&self) -> EvmClientConfig {
        EvmClientConfig {
            rpc_url: self.child_rpc_url.clone(),
            private_key: self.child_private_key.clone(),
        }
    }
}
