//! Network Registry
//!
//! Parent and child network descriptors, kept in a process-wide registry keyed
//! by chain ID. The gas estimator and message reader look up the child
//! network here to find its inbox and bridge contracts, so a custom child
//! chain must be registered before either is used.
//!
//! ## Usage
//!
//! ```ignore
//! use retryables_rs::networks::{add_custom_network, get_child_network, ChildNetwork};
//!
//! if get_child_network(child_chain_id).is_none() {
//!     add_custom_network(None, child_network)?;
//! }
//! ```

use alloy::primitives::Address;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::RetryableError;

/// Default deposit timeout for custom child networks (30 minutes)
pub const DEFAULT_DEPOSIT_TIMEOUT_MS: u64 = 1_800_000;

/// Core bridge contracts of a rollup, as seen from its parent chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EthBridge {
    /// Bridge contract (holds the message accumulator)
    pub bridge: Address,
    /// Delayed inbox
    pub inbox: Address,
    /// Sequencer inbox
    pub sequencer_inbox: Address,
    /// Outbox for child-to-parent messages
    pub outbox: Address,
    /// Rollup core contract
    pub rollup: Address,
}

/// A chain that acts as a parent (settlement) chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentNetwork {
    /// Native chain ID
    pub chain_id: u64,
    /// Display name
    pub name: String,
    /// Whether the network was registered at runtime
    pub is_custom: bool,
}

impl ParentNetwork {
    /// Create a runtime-registered parent network
    pub fn custom(chain_id: u64, name: &str) -> Self {
        Self {
            chain_id,
            name: name.to_string(),
            is_custom: true,
        }
    }
}

/// A rollup chain reachable through retryable tickets from its parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildNetwork {
    /// Native chain ID
    pub chain_id: u64,
    /// Chain ID of the parent network
    pub parent_chain_id: u64,
    /// Display name
    pub name: String,
    /// Bridge contracts on the parent chain
    pub eth_bridge: EthBridge,
    /// ERC20 fee token on the parent chain (custom fee chains only)
    pub native_token: Option<Address>,
    /// Whether the network was registered at runtime
    pub is_custom: bool,
    /// How long a deposit may take to appear on the child chain
    pub deposit_timeout_ms: u64,
}

impl ChildNetwork {
    /// Create a runtime-registered child network
    pub fn custom(
        chain_id: u64,
        parent_chain_id: u64,
        eth_bridge: EthBridge,
        native_token: Option<Address>,
    ) -> Self {
        Self {
            chain_id,
            parent_chain_id,
            name: "childChain".to_string(),
            eth_bridge,
            native_token,
            is_custom: true,
            deposit_timeout_ms: DEFAULT_DEPOSIT_TIMEOUT_MS,
        }
    }

    /// Check if fees on this chain are paid in an ERC20 token
    pub fn is_custom_fee(&self) -> bool {
        matches!(self.native_token, Some(token) if token != Address::ZERO)
    }

    /// Deposit timeout, `None` when it is disabled (0)
    pub fn deposit_timeout(&self) -> Option<Duration> {
        (self.deposit_timeout_ms > 0).then(|| Duration::from_millis(self.deposit_timeout_ms))
    }
}

/// Parent networks known without registration
fn well_known_parent_networks() -> HashMap<u64, ParentNetwork> {
    [(1u64, "Mainnet"), (17000, "Holesky"), (11155111, "Sepolia")]
        .into_iter()
        .map(|(chain_id, name)| {
            (
                chain_id,
                ParentNetwork {
                    chain_id,
                    name: name.to_string(),
                    is_custom: false,
                },
            )
        })
        .collect()
}

lazy_static! {
    static ref PARENT_NETWORKS: RwLock<HashMap<u64, ParentNetwork>> =
        RwLock::new(well_known_parent_networks());
    static ref CHILD_NETWORKS: RwLock<HashMap<u64, ChildNetwork>> = RwLock::new(HashMap::new());
}

// Writers never leave a partial entry, so poisoned guards are recovered.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

/// Look up a registered child network
pub fn get_child_network(chain_id: u64) -> Option<ChildNetwork> {
    read(&CHILD_NETWORKS).get(&chain_id).cloned()
}

/// Look up a registered parent network
pub fn get_parent_network(chain_id: u64) -> Option<ParentNetwork> {
    read(&PARENT_NETWORKS).get(&chain_id).cloned()
}

/// Check if a chain is known as either a parent or a child network
///
/// A child network (e.g. an L2) can itself be the parent of an L3.
pub fn is_known_network(chain_id: u64) -> bool {
    read(&PARENT_NETWORKS).contains_key(&chain_id) || read(&CHILD_NETWORKS).contains_key(&chain_id)
}

/// Register a custom child network, and optionally its parent
///
/// Fails with [`RetryableError::NetworkAlreadyIncluded`] if the child chain is
/// already registered. An already known parent is left untouched.
pub fn add_custom_network(
    parent: Option<ParentNetwork>,
    child: ChildNetwork,
) -> Result<(), RetryableError> {
    let mut children = write(&CHILD_NETWORKS);
    if children.contains_key(&child.chain_id) {
        return Err(RetryableError::NetworkAlreadyIncluded(child.chain_id));
    }

    if let Some(parent) = parent {
        let mut parents = write(&PARENT_NETWORKS);
        if parents.contains_key(&parent.chain_id) {
            debug!(chain_id = parent.chain_id, "Parent network already known");
        } else {
            info!(
                chain_id = parent.chain_id,
                name = %parent.name,
                "Registered custom parent network"
            );
            parents.insert(parent.chain_id, parent);
        }
    }

    info!(
        chain_id = child.chain_id,
        parent_chain_id = child.parent_chain_id,
        inbox = %child.eth_bridge.inbox,
        bridge = %child.eth_bridge.bridge,
        custom_fee = child.is_custom_fee(),
        "Registered custom child network"
    );
    children.insert(child.chain_id, child);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge() -> EthBridge {
        EthBridge {
            bridge: Address::repeat_byte(0x01),
            inbox: Address::repeat_byte(0x02),
            sequencer_inbox: Address::repeat_byte(0x03),
            outbox: Address::repeat_byte(0x04),
            rollup: Address::repeat_byte(0x05),
        }
    }

    // Registry state is process-wide, so each test uses its own chain IDs.

    #[test]
    fn test_well_known_parents() {
        assert!(is_known_network(1));
        assert!(is_known_network(11155111));
        assert!(get_parent_network(1).is_some_and(|n| !n.is_custom));
    }

    #[test]
    fn test_add_custom_network() {
        let child = ChildNetwork::custom(910_001, 910_000, bridge(), None);
        add_custom_network(Some(ParentNetwork::custom(910_000, "parentChain")), child.clone())
            .unwrap();

        assert_eq!(get_child_network(910_001), Some(child));
        assert!(is_known_network(910_000));
        assert!(get_parent_network(910_000).is_some_and(|n| n.is_custom));
    }

    #[test]
    fn test_add_custom_network_twice_fails() {
        let child = ChildNetwork::custom(910_011, 1, bridge(), None);
        add_custom_network(None, child.clone()).unwrap();

        let result = add_custom_network(None, child);
        assert!(matches!(
            result,
            Err(RetryableError::NetworkAlreadyIncluded(910_011))
        ));
    }

    #[test]
    fn test_known_parent_not_overwritten() {
        let child = ChildNetwork::custom(910_021, 1, bridge(), None);
        add_custom_network(Some(ParentNetwork::custom(1, "parentChain")), child).unwrap();

        let parent = get_parent_network(1).unwrap();
        assert_eq!(parent.name, "Mainnet");
        assert!(!parent.is_custom);
    }

    #[test]
    fn test_child_can_be_parent() {
        let child = ChildNetwork::custom(910_031, 1, bridge(), None);
        add_custom_network(None, child).unwrap();
        assert!(is_known_network(910_031));
    }

    #[test]
    fn test_custom_fee_detection() {
        let eth = ChildNetwork::custom(1, 1, bridge(), None);
        let zero = ChildNetwork::custom(1, 1, bridge(), Some(Address::ZERO));
        let token = ChildNetwork::custom(1, 1, bridge(), Some(Address::repeat_byte(0xaa)));

        assert!(!eth.is_custom_fee());
        assert!(!zero.is_custom_fee());
        assert!(token.is_custom_fee());
        assert_eq!(token.deposit_timeout_ms, DEFAULT_DEPOSIT_TIMEOUT_MS);
    }

    #[test]
    fn test_deposit_timeout() {
        let mut child = ChildNetwork::custom(1, 1, bridge(), None);
        assert_eq!(child.deposit_timeout(), Some(Duration::from_secs(1800)));

        child.deposit_timeout_ms = 0;
        assert_eq!(child.deposit_timeout(), None);
    }
}
