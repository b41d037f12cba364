//! Network registrar
//!
//! Makes sure the child chain behind an inbox is in the retryables network
//! registry before gas estimation and message tracking look it up.

use alloy::primitives::Address;
use eyre::Result;
use tracing::{debug, info};

use retryables_rs::{
    add_custom_network, get_child_network, is_known_network, ChildNetwork, ParentNetwork,
    RetryableError,
};

use crate::backend::PushBackend;

/// Registry name of a runtime-registered parent network
pub const PARENT_NETWORK_NAME: &str = "parentChain";

/// Networks resolved for a push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSetup {
    pub parent_chain_id: u64,
    /// Registered child network
    pub child: ChildNetwork,
    /// Fee token, read from the bridge when pushing to a custom fee chain
    pub native_token: Option<Address>,
}

/// Resolve both chains and register the child network if it is unknown
///
/// The parent is registered alongside it unless it is already known as a
/// parent or as a child (an L2 parent of an L3).
pub async fn ensure_networks<B>(
    backend: &B,
    inbox: Address,
    is_custom_fee: bool,
) -> Result<NetworkSetup>
where
    B: PushBackend + ?Sized,
{
    let child_chain_id = backend.child_chain_id().await?;
    let parent_chain_id = backend.parent_chain_id().await?;

    let eth_bridge = backend.eth_bridge(inbox).await?;
    let native_token = if is_custom_fee {
        Some(backend.native_token(eth_bridge.bridge).await?)
    } else {
        None
    };

    if get_child_network(child_chain_id).is_none() {
        info!(child_chain_id, parent_chain_id, "Adding custom child network");

        let parent = (!is_known_network(parent_chain_id))
            .then(|| ParentNetwork::custom(parent_chain_id, PARENT_NETWORK_NAME));
        let child = ChildNetwork::custom(child_chain_id, parent_chain_id, eth_bridge, native_token);

        match add_custom_network(parent, child) {
            Ok(()) => {}
            Err(RetryableError::NetworkAlreadyIncluded(id)) => {
                debug!(chain_id = id, "Child network registered concurrently");
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        debug!(child_chain_id, "Child network already registered");
    }

    let child =
        get_child_network(child_chain_id).ok_or(RetryableError::UnknownNetwork(child_chain_id))?;

    Ok(NetworkSetup {
        parent_chain_id,
        child,
        native_token,
    })
}
