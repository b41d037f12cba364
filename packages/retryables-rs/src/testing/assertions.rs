//! Common Test Assertions
//!
//! Assertion helpers for gas planning and block hash delivery.

use alloy::primitives::{B256, U256};
use eyre::{eyre, Result};

use crate::types::GasParams;

/// Assert that the deposit equals `gas_limit * max_fee_per_gas + max_submission_cost`
pub fn assert_deposit_consistent(params: &GasParams) -> Result<()> {
    let expected = params
        .gas_limit
        .saturating_mul(params.max_fee_per_gas)
        .saturating_add(params.max_submission_cost);
    if params.deposit != expected {
        return Err(eyre!(
            "Deposit mismatch: expected {} ({}), got {}",
            expected,
            params,
            params.deposit
        ));
    }
    Ok(())
}

/// Assert that a transaction value matches the planned deposit
pub fn assert_value_eq(actual: U256, expected: U256) -> Result<()> {
    if actual != expected {
        return Err(eyre!(
            "Value mismatch: expected {}, got {}",
            expected,
            actual
        ));
    }
    Ok(())
}

/// Assert that the child buffer holds the parent block hash
pub fn assert_block_hash_eq(block_number: u64, buffered: B256, parent: B256) -> Result<()> {
    if buffered == B256::ZERO {
        return Err(eyre!("Block {} hash not pushed to buffer", block_number));
    }
    if buffered != parent {
        return Err(eyre!(
            "Block {} hash mismatch: buffer has {}, parent has {}",
            block_number,
            buffered,
            parent
        ));
    }
    Ok(())
}
