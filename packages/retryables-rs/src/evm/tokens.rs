//! ERC20 Fee Token Helpers
//!
//! Custom fee chains pay child-chain fees in an ERC20 token held on the
//! parent chain. These helpers read allowances and send approvals.

use crate::evm::client::EvmClientWithSigner;
use crate::evm::contracts::ERC20;
use alloy::{
    primitives::{Address, B256, U256},
    providers::Provider,
    transports::Transport,
};
use eyre::{eyre, Result};
use tracing::debug;

/// Get the ERC20 token allowance
pub async fn get_token_allowance<T, P>(
    provider: &P,
    token_address: Address,
    owner: Address,
    spender: Address,
) -> Result<U256>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    let contract = ERC20::new(token_address, provider);
    let allowance = contract
        .allowance(owner, spender)
        .call()
        .await
        .map_err(|e| eyre!("Failed to get allowance: {}", e))?;
    Ok(allowance._0)
}

/// Send an `approve(spender, amount)` from the client's signer
///
/// Returns the transaction hash as soon as the node accepts it; wait with
/// [`EvmClientWithSigner::wait_for_receipt`].
pub async fn send_approval(
    client: &EvmClientWithSigner,
    token_address: Address,
    spender: Address,
    amount: U256,
) -> Result<B256> {
    debug!(
        token = %token_address,
        spender = %spender,
        amount = %amount,
        "Sending ERC20 approval"
    );

    let contract = ERC20::new(token_address, client.signing_provider());
    let pending = contract
        .approve(spender, amount)
        .send()
        .await
        .map_err(|e| eyre!("Failed to send approval: {}", e))?;
    Ok(*pending.tx_hash())
}

/// Check whether `spender` already holds an unlimited allowance
pub fn is_unlimited(allowance: U256) -> bool {
    allowance == U256::MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_unlimited() {
        assert!(is_unlimited(U256::MAX));
        assert!(!is_unlimited(U256::MAX - U256::from(1u64)));
        assert!(!is_unlimited(U256::ZERO));
    }
}
