//! EVM Chain Support Module
//!
//! Contract bindings and provider plumbing shared by the estimator and the
//! message reader.
//!
//! ## Submodules
//!
//! - `client` - Signer-backed RPC client wrapper
//! - `contracts` - Bridge, precompile and pusher bindings using alloy sol! macro
//! - `events` - Retryable message and pusher event parsing
//! - `queries` - Rollup contract and pusher/buffer queries
//! - `tokens` - ERC20 fee token helpers

pub mod client;
pub mod contracts;
pub mod events;
pub mod queries;
pub mod tokens;

// Re-export commonly used items
pub use client::{EvmClientConfig, EvmClientWithSigner, HttpProvider};
pub use contracts::{ArbRetryableTx, IBridge, IBuffer, IInbox, IPusher, NodeInterface, ERC20};
pub use events::{find_block_hashes_pushed, parse_retryable_messages, BlockHashesPushedEvent};
