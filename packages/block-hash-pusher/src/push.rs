//! Push orchestration
//!
//! A push runs strictly in order: recency guard, network setup, fee
//! planning, submission on the parent chain, then waiting for the retryable
//! ticket on the child chain and redeeming it by hand if it was not
//! auto-redeemed.

use alloy::{
    primitives::{Address, Bytes, B256, U256},
    sol_types::SolCall,
};
use eyre::{eyre, Result};
use tracing::{debug, info};

use retryables_rs::evm::{parse_retryable_messages, IPusher};
use retryables_rs::{ChildNetwork, GasParams, MessageStatus, RetryableError};

use crate::backend::{ParentReceipt, PushBackend};
use crate::guard::check_recent_push;
use crate::planner::plan_fees;
use crate::registrar::ensure_networks;

/// What to push and how
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushRequest {
    /// Inbox of the child chain's rollup
    pub inbox: Address,
    /// Number of most recent parent blocks to push
    pub num_blocks: U256,
    /// Skip if a push happened within this many blocks; `None`/0 disables
    pub min_elapsed: Option<u64>,
    /// The child chain pays fees in an ERC20 token
    pub is_custom_fee: bool,
    /// Do not fund the auto-redeem
    pub manual_redeem: bool,
}

/// Arguments of `Pusher.pushHashes` that do not depend on gas parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushCall {
    pub inbox: Address,
    pub num_blocks: U256,
    pub is_custom_fee: bool,
}

impl From<&PushRequest> for PushCall {
    fn from(request: &PushRequest) -> Self {
        Self {
            inbox: request.inbox,
            num_blocks: request.num_blocks,
            is_custom_fee: request.is_custom_fee,
        }
    }
}

impl PushCall {
    /// ABI-encoded `pushHashes` call with the given gas parameters
    pub fn calldata(&self, params: &GasParams) -> Bytes {
        IPusher::pushHashesCall {
            inbox: self.inbox,
            numBlocks: self.num_blocks,
            maxFeePerGas: params.max_fee_per_gas,
            gasLimit: params.gas_limit,
            submissionCost: params.max_submission_cost,
            isERC20Inbox: self.is_custom_fee,
        }
        .abi_encode()
        .into()
    }

    /// Value attached while estimating; custom fee chains pay in tokens
    pub fn estimation_value(&self, params: &GasParams) -> U256 {
        if self.is_custom_fee {
            U256::ZERO
        } else {
            params
                .gas_limit
                .saturating_mul(params.max_fee_per_gas)
                .saturating_add(params.max_submission_cost)
        }
    }
}

/// Result of a push
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// A recent push was found; nothing was sent
    Skipped { last_push_block: u64 },
    /// The ticket was redeemed automatically
    AutoRedeemed { receipt: ParentReceipt },
    /// The ticket was redeemed by a manual redeem transaction
    ManuallyRedeemed {
        receipt: ParentReceipt,
        redeem_tx: B256,
    },
}

impl PushOutcome {
    /// Parent receipt of the push, unless it was skipped
    pub fn receipt(&self) -> Option<&ParentReceipt> {
        match self {
            PushOutcome::Skipped { .. } => None,
            PushOutcome::AutoRedeemed { receipt } | PushOutcome::ManuallyRedeemed { receipt, .. } => {
                Some(receipt)
            }
        }
    }
}

/// Send `pushHashes` with `value = estimates.deposit` and wait for inclusion
pub async fn submit_push<B>(
    backend: &B,
    call: &PushCall,
    estimates: &GasParams,
) -> Result<ParentReceipt>
where
    B: PushBackend + ?Sized,
{
    let tx_hash = backend
        .send_push(call.calldata(estimates), estimates.deposit)
        .await?;
    info!("Parent transaction sent, waiting for confirmation. Hash: {}", tx_hash);

    let receipt = backend.confirm_parent_transaction(tx_hash).await?;
    if !receipt.status {
        return Err(eyre!("Parent transaction {} reverted", tx_hash));
    }
    info!("Parent transaction confirmed {}", receipt.block_number);
    if let Some(range) = receipt.pushed_range() {
        debug!(
            first = %range.first_block_number,
            last = %range.last_block_number,
            "Block hashes pushed"
        );
    }

    Ok(receipt)
}

/// Wait for the push's retryable ticket and redeem it if it is still pending
pub async fn await_redemption<B>(
    backend: &B,
    receipt: ParentReceipt,
    network: &ChildNetwork,
) -> Result<PushOutcome>
where
    B: PushBackend + ?Sized,
{
    let message = parse_retryable_messages(&receipt.logs, &network.eth_bridge, network.chain_id)?
        .into_iter()
        .next()
        .ok_or(RetryableError::MissingMessage(receipt.tx_hash))?;
    debug!(
        message_number = %message.message_number,
        sender = %message.sender,
        "Found retryable message"
    );

    match backend.wait_for_message_status(&message).await? {
        MessageStatus::Redeemed => {
            info!("Message automatically redeemed");
            Ok(PushOutcome::AutoRedeemed { receipt })
        }
        MessageStatus::FundsDepositedOnChild => {
            info!("Attempting manual redeem");
            let redeem_tx = backend.redeem(&message).await?;
            info!(tx_hash = %redeem_tx, "Manual redeem complete");
            Ok(PushOutcome::ManuallyRedeemed { receipt, redeem_tx })
        }
        status => Err(RetryableError::UnexpectedStatus(status).into()),
    }
}

/// Run a complete push
pub async fn push<B>(backend: &B, request: &PushRequest) -> Result<PushOutcome>
where
    B: PushBackend + ?Sized,
{
    if let Some(last_push_block) = check_recent_push(backend, request.min_elapsed).await? {
        return Ok(PushOutcome::Skipped { last_push_block });
    }

    let setup = ensure_networks(backend, request.inbox, request.is_custom_fee).await?;

    let call = PushCall::from(request);
    let estimates = plan_fees(backend, &call, request.manual_redeem, setup.native_token).await?;

    let receipt = submit_push(backend, &call, &estimates).await?;

    await_redemption(backend, receipt, &setup.child).await
}
