//! Common types for retryable ticket operations
//!
//! This module provides the gas parameter bundle, the message status state
//! machine and the decoded form of a submit-retryable inbox message.

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RetryableError;

// ============================================================================
// Gas Parameters
// ============================================================================

/// Gas parameters funding a retryable ticket
///
/// `deposit` is the total value the parent transaction must carry for the
/// ticket to be created and (if `gas_limit` and `max_fee_per_gas` are non-zero)
/// auto-redeemed on the child chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GasParams {
    /// Maximum cost of submitting the ticket on the child chain
    pub max_submission_cost: U256,
    /// Maximum fee per gas for the auto-redeem
    pub max_fee_per_gas: U256,
    /// Gas limit for the auto-redeem
    pub gas_limit: U256,
    /// Total value to send with the parent transaction
    pub deposit: U256,
}

impl GasParams {
    /// All-zero parameters: no submission cost, no auto-redeem
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build parameters from their parts, deriving the deposit
    ///
    /// `deposit = gas_limit * max_fee_per_gas + max_submission_cost + l2_call_value`
    pub fn from_parts(
        max_submission_cost: U256,
        max_fee_per_gas: U256,
        gas_limit: U256,
        l2_call_value: U256,
    ) -> Self {
        let deposit = gas_limit
            .saturating_mul(max_fee_per_gas)
            .saturating_add(max_submission_cost)
            .saturating_add(l2_call_value);

        Self {
            max_submission_cost,
            max_fee_per_gas,
            gas_limit,
            deposit,
        }
    }

    /// Keep only the submission cost; the ticket will need a manual redeem
    pub fn submission_only(self) -> Self {
        Self {
            max_submission_cost: self.max_submission_cost,
            max_fee_per_gas: U256::ZERO,
            gas_limit: U256::ZERO,
            deposit: self.max_submission_cost,
        }
    }
}

impl fmt::Display for GasParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "maxSubmissionCost={} maxFeePerGas={} gasLimit={} deposit={}",
            self.max_submission_cost, self.max_fee_per_gas, self.gas_limit, self.deposit
        )
    }
}

// ============================================================================
// Message Status
// ============================================================================

/// Status of a parent-to-child retryable message
///
/// Ordered by progress, so `status >= MessageStatus::FundsDepositedOnChild`
/// means the ticket exists on the child chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MessageStatus {
    /// The ticket has not been created on the child chain yet
    NotYetCreated,
    /// The ticket creation transaction reverted
    CreationFailed,
    /// The ticket exists and holds funds but has not been redeemed
    FundsDepositedOnChild,
    /// The ticket was redeemed successfully
    Redeemed,
    /// The ticket expired without a successful redeem
    Expired,
}

impl MessageStatus {
    /// Get the status as a screaming-case string
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::NotYetCreated => "NOT_YET_CREATED",
            MessageStatus::CreationFailed => "CREATION_FAILED",
            MessageStatus::FundsDepositedOnChild => "FUNDS_DEPOSITED_ON_CHILD",
            MessageStatus::Redeemed => "REDEEMED",
            MessageStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Retryable Messages
// ============================================================================

/// Size of the fixed-width header of a submit-retryable message (9 words)
pub const RETRYABLE_HEADER_LEN: usize = 9 * 32;

/// Decoded payload of an `InboxMessageDelivered` submit-retryable message
///
/// Layout: `to, l2CallValue, deposit, maxSubmissionFee, excessFeeRefundAddress,
/// callValueRefundAddress, gasLimit, maxFeePerGas, dataLength` as 32-byte
/// words, followed by `data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableMessageParams {
    /// Call destination on the child chain
    pub dest_address: Address,
    /// Value forwarded with the child call
    pub l2_call_value: U256,
    /// Value deposited on the parent chain (native token amount for custom fee chains)
    pub l1_value: U256,
    /// Maximum submission fee
    pub max_submission_fee: U256,
    /// Receiver of unused fees
    pub excess_fee_refund_address: Address,
    /// Receiver of the call value if the ticket expires or is cancelled
    pub call_value_refund_address: Address,
    /// Gas limit for the auto-redeem
    pub gas_limit: U256,
    /// Maximum fee per gas for the auto-redeem
    pub max_fee_per_gas: U256,
    /// Child call data
    pub data: Bytes,
}

impl RetryableMessageParams {
    /// Decode from raw `InboxMessageDelivered` data
    pub fn from_bytes(raw: &[u8]) -> Result<Self, RetryableError> {
        if raw.len() < RETRYABLE_HEADER_LEN {
            return Err(RetryableError::MalformedMessage(format!(
                "expected at least {} bytes, got {}",
                RETRYABLE_HEADER_LEN,
                raw.len()
            )));
        }

        let word = |i: usize| U256::from_be_slice(&raw[i * 32..(i + 1) * 32]);
        let address = |i: usize| Address::from_word(B256::from_slice(&raw[i * 32..(i + 1) * 32]));

        let data_len: usize = word(8).try_into().map_err(|_| {
            RetryableError::MalformedMessage("data length does not fit in usize".to_string())
        })?;
        let data_end = RETRYABLE_HEADER_LEN
            .checked_add(data_len)
            .filter(|end| *end <= raw.len())
            .ok_or_else(|| {
                RetryableError::MalformedMessage(format!(
                    "declared data length {} exceeds payload of {} bytes",
                    data_len,
                    raw.len() - RETRYABLE_HEADER_LEN
                ))
            })?;

        Ok(Self {
            dest_address: address(0),
            l2_call_value: word(1),
            l1_value: word(2),
            max_submission_fee: word(3),
            excess_fee_refund_address: address(4),
            call_value_refund_address: address(5),
            gas_limit: word(6),
            max_fee_per_gas: word(7),
            data: Bytes::copy_from_slice(&raw[RETRYABLE_HEADER_LEN..data_end]),
        })
    }

    /// Encode back into the packed inbox layout
    pub fn to_bytes(&self) -> Bytes {
        let mut out = Vec::with_capacity(RETRYABLE_HEADER_LEN + self.data.len());
        out.extend_from_slice(self.dest_address.into_word().as_slice());
        out.extend_from_slice(&self.l2_call_value.to_be_bytes::<32>());
        out.extend_from_slice(&self.l1_value.to_be_bytes::<32>());
        out.extend_from_slice(&self.max_submission_fee.to_be_bytes::<32>());
        out.extend_from_slice(self.excess_fee_refund_address.into_word().as_slice());
        out.extend_from_slice(self.call_value_refund_address.into_word().as_slice());
        out.extend_from_slice(&self.gas_limit.to_be_bytes::<32>());
        out.extend_from_slice(&self.max_fee_per_gas.to_be_bytes::<32>());
        out.extend_from_slice(&U256::from(self.data.len()).to_be_bytes::<32>());
        out.extend_from_slice(&self.data);
        out.into()
    }
}

/// A retryable message sent from the parent chain, identified on the child chain
/// by its ticket id (see [`crate::message::retryable_creation_id`])
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableMessage {
    /// Child chain ID
    pub child_chain_id: u64,
    /// Sender as recorded by the bridge (aliased when the caller is a contract)
    pub sender: Address,
    /// Bridge message index
    pub message_number: U256,
    /// Parent chain base fee at delivery
    pub parent_base_fee: U256,
    /// Decoded message payload
    pub message_data: RetryableMessageParams,
}
