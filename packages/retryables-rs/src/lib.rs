//! Retryables-RS: Retryable Ticket Toolkit for Arbitrum-Style Rollups
//!
//! This crate provides the cross-chain messaging pieces used by the block hash pusher:
//!
//! - **Networks** - Parent/child network descriptors and the process-wide network registry
//! - **Types** - Gas parameter bundles, message status, decoded retryable messages
//! - **Estimator** - Retryable gas estimation (submission fee, gas limit, max fee, deposit)
//! - **Message** - Retryable ticket ids, status reader, status waiter and manual redeemer
//! - **EVM Module** - Contract bindings, providers, event parsing, ERC20 helpers
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! retryables-rs = { path = "../retryables-rs" }
//! ```
//!
//! ## Feature Flags
//!
//! - `evm` - Enable EVM providers and contract bindings (default)
//! - `testing` - Enable fixture builders for downstream tests
//! - `full` - Enable all features

// Core modules (always available)
pub mod error;
pub mod networks;
pub mod redact;
pub mod types;

// Chain-specific modules (feature-gated)
#[cfg(feature = "evm")]
pub mod estimator;
#[cfg(feature = "evm")]
pub mod evm;
#[cfg(feature = "evm")]
pub mod message;

// Testing utilities (feature-gated)
#[cfg(feature = "testing")]
pub mod testing;

// Re-export commonly used items at the crate root
pub use error::RetryableError;
pub use networks::{
    add_custom_network, get_child_network, get_parent_network, is_known_network, ChildNetwork,
    EthBridge, ParentNetwork,
};
pub use types::{GasParams, MessageStatus, RetryableMessage, RetryableMessageParams};
