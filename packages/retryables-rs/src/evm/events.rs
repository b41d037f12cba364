//! EVM Event Parsing
//!
//! Pulls retryable messages and pusher events out of parent-chain receipt logs.
//!
//! A retryable creation emits two logs: the bridge's `MessageDelivered`
//! (kind, sender, base fee) and the inbox's `InboxMessageDelivered` (the
//! packed payload). They are joined on the message index.

use alloy::{primitives::U256, rpc::types::Log, sol_types::SolEvent};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::RetryableError;
use crate::evm::contracts::{IBridge, IInbox, IPusher, L1_MESSAGE_TYPE_SUBMIT_RETRYABLE};
use crate::networks::EthBridge;
use crate::types::{RetryableMessage, RetryableMessageParams};

/// `BlockHashesPushed` event data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHashesPushedEvent {
    /// First parent block whose hash was pushed
    pub first_block_number: U256,
    /// Last parent block whose hash was pushed
    pub last_block_number: U256,
}

/// Extract all submit-retryable messages from a parent receipt's logs
///
/// Only logs emitted by the rollup's bridge and inbox are considered.
pub fn parse_retryable_messages(
    logs: &[Log],
    eth_bridge: &EthBridge,
    child_chain_id: u64,
) -> Result<Vec<RetryableMessage>, RetryableError> {
    let mut payloads: HashMap<U256, RetryableMessageParams> = HashMap::new();
    for log in logs.iter().filter(|l| l.address() == eth_bridge.inbox) {
        if log.topics().first() != Some(&IInbox::InboxMessageDelivered::SIGNATURE_HASH) {
            continue;
        }
        let decoded = log
            .log_decode::<IInbox::InboxMessageDelivered>()
            .map_err(|e| RetryableError::MalformedMessage(e.to_string()))?;
        let event = decoded.inner.data;
        payloads.insert(
            event.messageNum,
            RetryableMessageParams::from_bytes(&event.data)?,
        );
    }

    let mut messages = Vec::new();
    for log in logs.iter().filter(|l| l.address() == eth_bridge.bridge) {
        if log.topics().first() != Some(&IBridge::MessageDelivered::SIGNATURE_HASH) {
            continue;
        }
        let decoded = log
            .log_decode::<IBridge::MessageDelivered>()
            .map_err(|e| RetryableError::MalformedMessage(e.to_string()))?;
        let event = decoded.inner.data;

        if event.kind != L1_MESSAGE_TYPE_SUBMIT_RETRYABLE {
            debug!(kind = event.kind, index = %event.messageIndex, "Skipping non-retryable message");
            continue;
        }

        match payloads.remove(&event.messageIndex) {
            Some(message_data) => messages.push(RetryableMessage {
                child_chain_id,
                sender: event.sender,
                message_number: event.messageIndex,
                parent_base_fee: event.baseFeeL1,
                message_data,
            }),
            None => warn!(
                index = %event.messageIndex,
                "MessageDelivered without matching InboxMessageDelivered"
            ),
        }
    }

    Ok(messages)
}

/// Find the pusher's `BlockHashesPushed` event in a receipt's logs
pub fn find_block_hashes_pushed(logs: &[Log]) -> Option<BlockHashesPushedEvent> {
    logs.iter()
        .filter(|l| l.topics().first() == Some(&IPusher::BlockHashesPushed::SIGNATURE_HASH))
        .find_map(|l| l.log_decode::<IPusher::BlockHashesPushed>().ok())
        .map(|decoded| BlockHashesPushedEvent {
            first_block_number: decoded.inner.data.firstBlockNumber,
            last_block_number: decoded.inner.data.lastBlockNumber,
        })
}
