//! Chain access for the push flow
//!
//! [`PushBackend`] is every chain interaction the guard, registrar, planner,
//! submitter and waiter need. [`EvmPushBackend`] implements it over alloy
//! providers for the parent and child chains.

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, B256, U256},
    providers::Provider,
    rpc::types::{Log, TransactionReceipt, TransactionRequest},
};
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use std::time::Duration;
use tracing::{debug, info};

use retryables_rs::estimator::RetryableGasEstimator;
use retryables_rs::evm::{
    find_block_hashes_pushed, queries, tokens, BlockHashesPushedEvent, EvmClientWithSigner,
};
use retryables_rs::message::ChildMessageClient;
use retryables_rs::{EthBridge, GasParams, MessageStatus, RetryableMessage};

use crate::config::Config;
use crate::push::PushCall;

/// Parent chain receipt, reduced to what the push flow reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentReceipt {
    pub tx_hash: B256,
    pub block_number: u64,
    /// Whether execution succeeded
    pub status: bool,
    pub logs: Vec<Log>,
}

impl ParentReceipt {
    pub fn from_receipt(receipt: &TransactionReceipt) -> Result<Self> {
        let block_number = receipt
            .block_number
            .ok_or_else(|| eyre!("Receipt {} has no block number", receipt.transaction_hash))?;

        Ok(Self {
            tx_hash: receipt.transaction_hash,
            block_number,
            status: receipt.status(),
            logs: receipt.inner.logs().to_vec(),
        })
    }

    /// Block range announced by the pusher's `BlockHashesPushed` event
    pub fn pushed_range(&self) -> Option<BlockHashesPushedEvent> {
        find_block_hashes_pushed(&self.logs)
    }
}

/// Chain operations used by a push
#[async_trait]
pub trait PushBackend: Send + Sync {
    // Recency guard

    /// Latest parent block number
    async fn latest_parent_block(&self) -> Result<u64>;

    /// Blocks of `BlockHashesPushed` logs from the pusher since `from_block`
    async fn push_log_blocks(&self, from_block: u64) -> Result<Vec<u64>>;

    // Network registrar

    async fn parent_chain_id(&self) -> Result<u64>;

    async fn child_chain_id(&self) -> Result<u64>;

    /// Rollup contracts reachable from `inbox`
    async fn eth_bridge(&self, inbox: Address) -> Result<EthBridge>;

    /// Fee token of a custom fee chain's bridge
    async fn native_token(&self, bridge: Address) -> Result<Address>;

    // Fee/gas planner

    /// Allowance of the pusher over the parent signer's fee tokens
    async fn fee_token_allowance(&self, token: Address) -> Result<U256>;

    /// Approve the pusher for an unlimited amount of `token`
    async fn send_fee_token_approval(&self, token: Address) -> Result<B256>;

    /// Estimate the retryable gas parameters of a push
    async fn estimate_push(&self, call: &PushCall) -> Result<GasParams>;

    // Transaction submitter

    /// Send a pusher call with `value` attached
    async fn send_push(&self, calldata: Bytes, value: U256) -> Result<B256>;

    /// Wait until a parent transaction is mined
    async fn confirm_parent_transaction(&self, tx_hash: B256) -> Result<ParentReceipt>;

    // Redemption waiter

    /// Wait until the ticket for `message` is created and return its status
    async fn wait_for_message_status(&self, message: &RetryableMessage) -> Result<MessageStatus>;

    /// Manually redeem the ticket for `message`, returning the redeem transaction
    async fn redeem(&self, message: &RetryableMessage) -> Result<B256>;
}

/// [`PushBackend`] over JSON-RPC
pub struct EvmPushBackend {
    parent: EvmClientWithSigner,
    child: EvmClientWithSigner,
    pusher: Address,
    estimator: RetryableGasEstimator,
    poll_interval: Duration,
    message_timeout: Option<Duration>,
}

impl EvmPushBackend {
    /// Build parent and child clients from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let parent = EvmClientWithSigner::new(&config.parent_client())
            .wrap_err("Failed to create parent chain client")?;
        let child = EvmClientWithSigner::new(&config.child_client())
            .wrap_err("Failed to create child chain client")?;
        let estimator = RetryableGasEstimator::new(child.provider().clone());

        Ok(Self {
            parent,
            child,
            pusher: config.pusher_address,
            estimator,
            poll_interval: config.poll_interval(),
            message_timeout: config.message_timeout(),
        })
    }

    /// Parent chain client
    pub fn parent(&self) -> &EvmClientWithSigner {
        &self.parent
    }

    /// Child chain client
    pub fn child(&self) -> &EvmClientWithSigner {
        &self.child
    }

    fn message_client(&self, message: &RetryableMessage) -> ChildMessageClient {
        ChildMessageClient::new(self.child.provider().clone(), message.clone())
    }
}

#[async_trait]
impl PushBackend for EvmPushBackend {
    async fn latest_parent_block(&self) -> Result<u64> {
        self.parent.get_block_number().await
    }

    async fn push_log_blocks(&self, from_block: u64) -> Result<Vec<u64>> {
        queries::get_push_log_blocks(self.parent.provider(), self.pusher, from_block).await
    }

    async fn parent_chain_id(&self) -> Result<u64> {
        self.parent.get_chain_id().await
    }

    async fn child_chain_id(&self) -> Result<u64> {
        self.child.get_chain_id().await
    }

    async fn eth_bridge(&self, inbox: Address) -> Result<EthBridge> {
        queries::get_eth_bridge(self.parent.provider(), inbox).await
    }

    async fn native_token(&self, bridge: Address) -> Result<Address> {
        queries::get_native_token(self.parent.provider(), bridge).await
    }

    async fn fee_token_allowance(&self, token: Address) -> Result<U256> {
        tokens::get_token_allowance(
            self.parent.provider(),
            token,
            self.parent.get_signer_address(),
            self.pusher,
        )
        .await
    }

    async fn send_fee_token_approval(&self, token: Address) -> Result<B256> {
        tokens::send_approval(&self.parent, token, self.pusher, U256::MAX).await
    }

    async fn estimate_push(&self, call: &PushCall) -> Result<GasParams> {
        let from = self.parent.get_signer_address();
        let pusher = self.pusher;

        let populated = self
            .estimator
            .populate_function_params(self.parent.provider(), |params| {
                TransactionRequest::default()
                    .with_from(from)
                    .with_to(pusher)
                    .with_input(call.calldata(params))
                    .with_value(call.estimation_value(params))
            })
            .await
            .wrap_err("Failed to estimate push gas parameters")?;

        Ok(populated.estimates)
    }

    async fn send_push(&self, calldata: Bytes, value: U256) -> Result<B256> {
        let tx = TransactionRequest::default()
            .with_to(self.pusher)
            .with_input(calldata)
            .with_value(value);

        let pending = self
            .parent
            .signing_provider()
            .send_transaction(tx)
            .await
            .wrap_err("Failed to send push transaction")?;
        Ok(*pending.tx_hash())
    }

    async fn confirm_parent_transaction(&self, tx_hash: B256) -> Result<ParentReceipt> {
        let receipt = self
            .parent
            .wait_for_receipt(tx_hash, self.poll_interval)
            .await?;
        ParentReceipt::from_receipt(&receipt)
    }

    async fn wait_for_message_status(&self, message: &RetryableMessage) -> Result<MessageStatus> {
        let client = self.message_client(message);
        let timeout = client.wait_timeout(self.message_timeout);
        info!(
            ticket_id = %client.ticket_id(),
            message_number = %message.message_number,
            ?timeout,
            "Waiting for retryable ticket on child chain"
        );
        client.wait_for_status(self.poll_interval, timeout).await
    }

    async fn redeem(&self, message: &RetryableMessage) -> Result<B256> {
        let client = self.message_client(message);
        let receipt = client.redeem(&self.child).await?;
        debug!(
            ticket_id = %client.ticket_id(),
            tx_hash = %receipt.transaction_hash,
            gas_used = receipt.gas_used,
            "Redeem receipt"
        );
        Ok(receipt.transaction_hash)
    }
}
