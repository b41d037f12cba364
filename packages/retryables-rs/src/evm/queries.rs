//! EVM Query Helpers
//!
//! Typed read-only queries against the rollup bridge contracts and the
//! pusher/buffer pair.

use alloy::{
    primitives::{Address, B256, U256},
    providers::Provider,
    rpc::types::Filter,
    sol_types::SolEvent,
};
use eyre::{eyre, Result, WrapErr};
use tracing::debug;

use crate::evm::client::HttpProvider;
use crate::evm::contracts::{IBridge, IBuffer, IERC20Bridge, IInbox, IPusher, IRollupCore};
use crate::networks::EthBridge;

// =========================================================================
// Bridge Contract Queries
// =========================================================================

/// Resolve the rollup's bridge contracts starting from its delayed inbox
pub async fn get_eth_bridge(provider: &HttpProvider, inbox: Address) -> Result<EthBridge> {
    let inbox_contract = IInbox::new(inbox, provider);

    let bridge = inbox_contract
        .bridge()
        .call()
        .await
        .map_err(|e| eyre!("Failed to get bridge from inbox {}: {}", inbox, e))?
        ._0;
    let sequencer_inbox = inbox_contract
        .sequencerInbox()
        .call()
        .await
        .map_err(|e| eyre!("Failed to get sequencer inbox: {}", e))?
        ._0;
    let rollup = IBridge::new(bridge, provider)
        .rollup()
        .call()
        .await
        .map_err(|e| eyre!("Failed to get rollup from bridge {}: {}", bridge, e))?
        ._0;
    let outbox = IRollupCore::new(rollup, provider)
        .outbox()
        .call()
        .await
        .map_err(|e| eyre!("Failed to get outbox from rollup {}: {}", rollup, e))?
        ._0;

    let eth_bridge = EthBridge {
        bridge,
        inbox,
        sequencer_inbox,
        outbox,
        rollup,
    };
    debug!(?eth_bridge, "Resolved rollup contracts");
    Ok(eth_bridge)
}

/// Get the fee token of a custom fee chain's bridge
pub async fn get_native_token(provider: &HttpProvider, bridge: Address) -> Result<Address> {
    let result = IERC20Bridge::new(bridge, provider)
        .nativeToken()
        .call()
        .await
        .map_err(|e| eyre!("Failed to get native token from bridge {}: {}", bridge, e))?;
    Ok(result._0)
}

// =========================================================================
// Pusher / Buffer Queries
// =========================================================================

/// Block numbers of `BlockHashesPushed` logs emitted by `pusher` since `from_block`
pub async fn get_push_log_blocks(
    provider: &HttpProvider,
    pusher: Address,
    from_block: u64,
) -> Result<Vec<u64>> {
    let filter = Filter::new()
        .address(pusher)
        .event_signature(IPusher::BlockHashesPushed::SIGNATURE_HASH)
        .from_block(from_block);

    let logs = provider
        .get_logs(&filter)
        .await
        .wrap_err("Failed to query BlockHashesPushed logs")?;
    Ok(logs.iter().filter_map(|log| log.block_number).collect())
}

/// Parent block hash stored in the child buffer, zero if not received
pub async fn get_buffered_block_hash(
    provider: &HttpProvider,
    buffer: Address,
    block_number: u64,
) -> Result<B256> {
    let result = IBuffer::new(buffer, provider)
        .parentChainBlockHash(U256::from(block_number))
        .call()
        .await
        .map_err(|e| eyre!("Failed to read buffered hash of block {}: {}", block_number, e))?;
    Ok(result._0)
}
