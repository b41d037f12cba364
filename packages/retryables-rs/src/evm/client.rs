//! EVM RPC Client Wrapper
//!
//! Provides a signer-backed client for one chain. Reads go through a plain
//! HTTP provider; writes go through a provider built with alloy's
//! recommended fillers so nonce, gas limit and EIP-1559 fees are populated
//! automatically.

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, B256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::TransactionReceipt,
    signers::local::PrivateKeySigner,
    transports::http::{reqwest::Url, Client, Http},
};
use eyre::{eyre, Result, WrapErr};
use std::time::Duration;
use tracing::{debug, info};

use crate::redact::Redacted;

/// Plain HTTP provider used for reads
pub type HttpProvider = RootProvider<Http<Client>>;

/// EVM client configuration
#[derive(Debug, Clone)]
pub struct EvmClientConfig {
    /// RPC URL (e.g., "http://localhost:8545")
    pub rpc_url: String,
    /// Private key for signing (hex, with or without 0x prefix)
    pub private_key: Redacted<String>,
}

/// EVM RPC client with signing capabilities
#[derive(Clone)]
pub struct EvmClientWithSigner {
    /// Read-only provider
    provider: HttpProvider,
    /// Parsed RPC URL, reused for signing providers
    rpc_url: Url,
    /// Local key signer
    signer: PrivateKeySigner,
    /// Signer address
    pub signer_address: Address,
}

impl EvmClientWithSigner {
    /// Create a new EVM client with signing capabilities
    ///
    /// No RPC request is made; an unreachable endpoint surfaces on first use.
    pub fn new(config: &EvmClientConfig) -> Result<Self> {
        let rpc_url: Url = config
            .rpc_url
            .parse()
            .map_err(|e| eyre!("Invalid RPC URL '{}': {}", config.rpc_url, e))?;

        let signer: PrivateKeySigner = config
            .private_key
            .expose()
            .parse()
            .wrap_err("Invalid private key")?;
        let signer_address = signer.address();

        let provider = ProviderBuilder::new().on_http(rpc_url.clone());

        info!(
            rpc_url = %config.rpc_url,
            address = %signer_address,
            "Created EVM client with signer"
        );

        Ok(Self {
            provider,
            rpc_url,
            signer,
            signer_address,
        })
    }

    /// Get the read-only provider
    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }

    /// Build a provider that signs with this client's key and fills nonce/gas/fees
    pub fn signing_provider(&self) -> impl Provider<Http<Client>, Ethereum> + Clone {
        let wallet = EthereumWallet::from(self.signer.clone());
        ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_http(self.rpc_url.clone())
    }

    /// Get the current block number
    pub async fn get_block_number(&self) -> Result<u64> {
        let block = self
            .provider
            .get_block_number()
            .await
            .wrap_err("Failed to get block number")?;
        Ok(block)
    }

    /// Get the chain ID from the RPC
    pub async fn get_chain_id(&self) -> Result<u64> {
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .wrap_err("Failed to get chain ID")?;
        Ok(chain_id)
    }

    /// Get the signer address
    pub fn get_signer_address(&self) -> Address {
        self.signer_address
    }

    /// Poll for the receipt of a transaction
    pub async fn wait_for_receipt(
        &self,
        tx_hash: B256,
        poll_interval: Duration,
    ) -> Result<TransactionReceipt> {
        loop {
            if let Some(receipt) = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .wrap_err("Failed to get transaction receipt")?
            {
                return Ok(receipt);
            }
            debug!(tx_hash = %tx_hash, "Transaction not yet mined");
            tokio::time::sleep(poll_interval).await;
        }
    }
}

impl std::fmt::Debug for EvmClientWithSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmClientWithSigner")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("signer_address", &self.signer_address)
            .finish()
    }
}
