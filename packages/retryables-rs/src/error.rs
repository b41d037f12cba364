//! Typed errors for retryable operations
//!
//! Most functions in this crate return `eyre::Result` with context attached.
//! The variants here are the failures callers are expected to match on.

use alloy::primitives::B256;
use std::time::Duration;
use thiserror::Error;

use crate::types::MessageStatus;

/// Errors raised by the retryable toolkit
#[derive(Debug, Error)]
pub enum RetryableError {
    /// The estimation call did not revert with `RetryableData`
    #[error("no RetryableData revert found in estimation call: {0}")]
    NoRetryableData(String),

    /// The child chain has not been added to the network registry
    #[error("unrecognized child network {0}, register it with add_custom_network")]
    UnknownNetwork(u64),

    /// A child network with the same chain id is already registered
    #[error("network {0} already included")]
    NetworkAlreadyIncluded(u64),

    /// The parent receipt carries no retryable message
    #[error("no retryable message found in parent transaction {0}")]
    MissingMessage(B256),

    /// The message data is shorter than its fixed header or declared length
    #[error("malformed retryable message data: {0}")]
    MalformedMessage(String),

    /// The message ended up in a status the caller cannot handle
    #[error("Unexpected Message Status: {0}")]
    UnexpectedStatus(MessageStatus),

    /// Waiting for the ticket creation exceeded the configured timeout
    #[error("timed out after {timeout:?} waiting for retryable ticket {ticket_id}")]
    Timeout { ticket_id: B256, timeout: Duration },
}
