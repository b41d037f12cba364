//! Retryable Gas Estimation
//!
//! Estimates the four gas parameters a retryable ticket needs (submission
//! cost, max fee per gas, gas limit, deposit) for a parent-chain call that
//! ends up creating the ticket through an inbox.
//!
//! The inbox reverts with `RetryableData(...)` when it sees a gas limit or
//! max fee of exactly 1. [`RetryableGasEstimator::populate_function_params`]
//! uses that to learn the ticket the call would create without knowing how
//! the calling contract builds it, estimates real parameters for that
//! ticket, and returns the call rebuilt with them.

use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, Bytes, U256},
    providers::Provider,
    rpc::types::{BlockTransactionsKind, TransactionRequest},
    sol_types::SolError,
};
use eyre::{eyre, Result, WrapErr};
use tracing::{debug, info};

use crate::error::RetryableError;
use crate::evm::client::HttpProvider;
use crate::evm::contracts::{IInbox, NodeInterface, NODE_INTERFACE_ADDRESS};
use crate::networks::get_child_network;
use crate::types::GasParams;

/// Default increase applied to the submission fee, in percent
pub const DEFAULT_SUBMISSION_FEE_PERCENT_INCREASE: u64 = 300;

/// Default increase applied to the child gas price, in percent
pub const DEFAULT_GAS_PRICE_PERCENT_INCREASE: u64 = 500;

/// Default increase applied to the estimated gas limit, in percent
pub const DEFAULT_GAS_LIMIT_PERCENT_INCREASE: u64 = 0;

/// Add `percent` percent to `value`
pub fn percent_increase(value: U256, percent: u64) -> U256 {
    value.saturating_add(value.saturating_mul(U256::from(percent)) / U256::from(100u64))
}

/// Safety margins applied on top of raw estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasOverrides {
    /// Increase of the submission fee returned by the inbox
    pub max_submission_fee_percent_increase: u64,
    /// Increase of the child chain gas price
    pub max_fee_per_gas_percent_increase: u64,
    /// Increase of the gas limit returned by the node interface
    pub gas_limit_percent_increase: u64,
    /// Lower bound for the gas limit
    pub min_gas_limit: U256,
}

impl Default for GasOverrides {
    fn default() -> Self {
        Self {
            max_submission_fee_percent_increase: DEFAULT_SUBMISSION_FEE_PERCENT_INCREASE,
            max_fee_per_gas_percent_increase: DEFAULT_GAS_PRICE_PERCENT_INCREASE,
            gas_limit_percent_increase: DEFAULT_GAS_LIMIT_PERCENT_INCREASE,
            min_gas_limit: U256::ZERO,
        }
    }
}

/// Ticket parameters reported by the inbox's `RetryableData` revert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableData {
    pub from: Address,
    pub to: Address,
    pub l2_call_value: U256,
    pub deposit: U256,
    pub max_submission_cost: U256,
    pub excess_fee_refund_address: Address,
    pub call_value_refund_address: Address,
    pub gas_limit: U256,
    pub max_fee_per_gas: U256,
    pub data: Bytes,
}

impl From<IInbox::RetryableData> for RetryableData {
    fn from(err: IInbox::RetryableData) -> Self {
        Self {
            from: err.from,
            to: err.to,
            l2_call_value: err.l2CallValue,
            deposit: err.deposit,
            max_submission_cost: err.maxSubmissionCost,
            excess_fee_refund_address: err.excessFeeRefundAddress,
            call_value_refund_address: err.callValueRefundAddress,
            gas_limit: err.gasLimit,
            max_fee_per_gas: err.maxFeePerGas,
            data: err.data,
        }
    }
}

impl RetryableData {
    /// Decode from the revert data of an estimation call
    pub fn from_revert_data(revert: &[u8]) -> Result<Self, RetryableError> {
        IInbox::RetryableData::abi_decode(revert, true)
            .map(Self::from)
            .map_err(|e| RetryableError::NoRetryableData(e.to_string()))
    }
}

/// Gas parameters that make the inbox revert with `RetryableData`
pub fn error_triggering_params() -> GasParams {
    GasParams::from_parts(
        U256::from(1u64),
        U256::from(1u64),
        U256::from(1u64),
        U256::ZERO,
    )
}

/// Result of [`RetryableGasEstimator::populate_function_params`]
#[derive(Debug, Clone)]
pub struct PopulatedFunctionParams {
    /// Estimated gas parameters
    pub estimates: GasParams,
    /// Ticket the call creates
    pub retryable: RetryableData,
    /// Calldata of the call rebuilt with `estimates`
    pub data: Bytes,
    /// Target of the call
    pub to: Address,
    /// Value of the call rebuilt with `estimates`
    pub value: U256,
}

/// Split a transaction request into its target, calldata and value
pub fn request_parts(request: &TransactionRequest) -> Result<(Address, Bytes, U256)> {
    let to = request
        .to
        .as_ref()
        .and_then(|kind| kind.to().copied())
        .ok_or_else(|| eyre!("Estimation request has no call target"))?;
    let data = request.input.input().cloned().unwrap_or_default();
    let value = request.value.unwrap_or_default();
    Ok((to, data, value))
}

/// Retryable gas estimator bound to a child chain
#[derive(Debug, Clone)]
pub struct RetryableGasEstimator {
    child_provider: HttpProvider,
    overrides: GasOverrides,
}

impl RetryableGasEstimator {
    pub fn new(child_provider: HttpProvider) -> Self {
        Self {
            child_provider,
            overrides: GasOverrides::default(),
        }
    }

    /// Replace the default safety margins
    pub fn with_overrides(mut self, overrides: GasOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Max fee per gas: child gas price plus margin
    pub async fn estimate_max_fee_per_gas(&self) -> Result<U256> {
        let gas_price = self
            .child_provider
            .get_gas_price()
            .await
            .wrap_err("Failed to get child gas price")?;
        Ok(percent_increase(
            U256::from(gas_price),
            self.overrides.max_fee_per_gas_percent_increase,
        ))
    }

    /// Submission fee for `data_len` bytes of calldata, plus margin
    pub async fn estimate_submission_fee(
        &self,
        parent_provider: &HttpProvider,
        inbox: Address,
        parent_base_fee: U256,
        data_len: usize,
    ) -> Result<U256> {
        let contract = IInbox::new(inbox, parent_provider);
        let fee = contract
            .calculateRetryableSubmissionFee(U256::from(data_len), parent_base_fee)
            .call()
            .await
            .map_err(|e| eyre!("Failed to calculate submission fee: {}", e))?;
        Ok(percent_increase(
            fee._0,
            self.overrides.max_submission_fee_percent_increase,
        ))
    }

    /// Gas limit of the auto-redeem, simulated through the node interface
    pub async fn estimate_gas_limit(&self, retryable: &RetryableData) -> Result<U256> {
        let one_ether = U256::from(10u64).pow(U256::from(18u64));
        let node_interface = NodeInterface::new(NODE_INTERFACE_ADDRESS, &self.child_provider);
        let gas = node_interface
            .estimateRetryableTicket(
                retryable.from,
                one_ether.saturating_add(retryable.l2_call_value),
                retryable.to,
                retryable.l2_call_value,
                retryable.excess_fee_refund_address,
                retryable.call_value_refund_address,
                retryable.data.clone(),
            )
            .estimate_gas()
            .await
            .map_err(|e| eyre!("Failed to estimate retryable gas limit: {}", e))?;

        let gas_limit = percent_increase(U256::from(gas), self.overrides.gas_limit_percent_increase);
        Ok(gas_limit.max(self.overrides.min_gas_limit))
    }

    /// Estimate every gas parameter for a ticket
    pub async fn estimate_all(
        &self,
        parent_provider: &HttpProvider,
        inbox: Address,
        retryable: &RetryableData,
    ) -> Result<GasParams> {
        let parent_base_fee = get_base_fee(parent_provider).await?;

        let (max_submission_cost, max_fee_per_gas, gas_limit) = tokio::try_join!(
            self.estimate_submission_fee(
                parent_provider,
                inbox,
                parent_base_fee,
                retryable.data.len()
            ),
            self.estimate_max_fee_per_gas(),
            self.estimate_gas_limit(retryable),
        )?;

        let estimates = GasParams::from_parts(
            max_submission_cost,
            max_fee_per_gas,
            gas_limit,
            retryable.l2_call_value,
        );
        debug!(%estimates, %parent_base_fee, "Estimated retryable gas parameters");
        Ok(estimates)
    }

    /// Estimate gas parameters for the ticket created by a parent-chain call
    ///
    /// `data_fn` builds the call for a given set of gas parameters. It is
    /// invoked twice: once with parameters that force the `RetryableData`
    /// revert, and once with the final estimates.
    pub async fn populate_function_params<F>(
        &self,
        parent_provider: &HttpProvider,
        data_fn: F,
    ) -> Result<PopulatedFunctionParams>
    where
        F: Fn(&GasParams) -> TransactionRequest,
    {
        let child_chain_id = self
            .child_provider
            .get_chain_id()
            .await
            .wrap_err("Failed to get child chain ID")?;
        let network = get_child_network(child_chain_id)
            .ok_or(RetryableError::UnknownNetwork(child_chain_id))?;

        let probe = data_fn(&error_triggering_params());
        let revert = match parent_provider.call(&probe).await {
            Ok(output) => {
                return Err(RetryableError::NoRetryableData(format!(
                    "estimation call succeeded with output {}",
                    output
                ))
                .into())
            }
            Err(err) => err
                .as_error_resp()
                .and_then(|payload| payload.as_revert_data())
                .ok_or_else(|| RetryableError::NoRetryableData(err.to_string()))?,
        };
        let retryable = RetryableData::from_revert_data(&revert)?;
        debug!(
            from = %retryable.from,
            to = %retryable.to,
            data_len = retryable.data.len(),
            "Decoded RetryableData from estimation call"
        );

        let estimates = self
            .estimate_all(parent_provider, network.eth_bridge.inbox, &retryable)
            .await?;

        let (to, data, value) = request_parts(&data_fn(&estimates))?;

        info!(
            child_chain_id,
            max_submission_cost = %estimates.max_submission_cost,
            max_fee_per_gas = %estimates.max_fee_per_gas,
            gas_limit = %estimates.gas_limit,
            deposit = %estimates.deposit,
            "Populated retryable gas parameters"
        );

        Ok(PopulatedFunctionParams {
            estimates,
            retryable,
            data,
            to,
            value,
        })
    }
}

/// Base fee of the latest parent block
pub async fn get_base_fee(provider: &HttpProvider) -> Result<U256> {
    let block = provider
        .get_block_by_number(BlockNumberOrTag::Latest, BlockTransactionsKind::Hashes)
        .await
        .wrap_err("Failed to get latest block")?
        .ok_or_else(|| eyre!("Latest block not found"))?;
    let base_fee = block
        .header
        .base_fee_per_gas
        .ok_or_else(|| eyre!("Latest block has no base fee"))?;
    Ok(U256::from(base_fee))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::network::TransactionBuilder;

    #[test]
    fn test_percent_increase() {
        assert_eq!(percent_increase(U256::from(100u64), 0), U256::from(100u64));
        assert_eq!(percent_increase(U256::from(100u64), 300), U256::from(400u64));
        assert_eq!(percent_increase(U256::from(7u64), 500), U256::from(42u64));
        // integer division rounds the increase down
        assert_eq!(percent_increase(U256::from(3u64), 50), U256::from(4u64));
        assert_eq!(percent_increase(U256::MAX, 100), U256::MAX);
    }

    #[test]
    fn test_default_overrides() {
        let overrides = GasOverrides::default();
        assert_eq!(overrides.max_submission_fee_percent_increase, 300);
        assert_eq!(overrides.max_fee_per_gas_percent_increase, 500);
        assert_eq!(overrides.gas_limit_percent_increase, 0);
        assert_eq!(overrides.min_gas_limit, U256::ZERO);
    }

    #[test]
    fn test_error_triggering_params() {
        let params = error_triggering_params();
        assert_eq!(params.gas_limit, U256::from(1u64));
        assert_eq!(params.max_fee_per_gas, U256::from(1u64));
        assert_eq!(params.max_submission_cost, U256::from(1u64));
        assert_eq!(params.deposit, U256::from(2u64));
    }

    #[test]
    fn test_retryable_data_from_revert() {
        let err = IInbox::RetryableData {
            from: Address::repeat_byte(0x01),
            to: Address::repeat_byte(0x02),
            l2CallValue: U256::from(5u64),
            deposit: U256::from(2u64),
            maxSubmissionCost: U256::from(1u64),
            excessFeeRefundAddress: Address::repeat_byte(0x03),
            callValueRefundAddress: Address::repeat_byte(0x04),
            gasLimit: U256::from(1u64),
            maxFeePerGas: U256::from(1u64),
            data: Bytes::from(vec![9, 9]),
        };

        let decoded = RetryableData::from_revert_data(&err.abi_encode()).unwrap();
        assert_eq!(decoded.from, Address::repeat_byte(0x01));
        assert_eq!(decoded.l2_call_value, U256::from(5u64));
        assert_eq!(decoded.call_value_refund_address, Address::repeat_byte(0x04));
        assert_eq!(decoded.data.as_ref(), &[9, 9]);
    }

    #[test]
    fn test_retryable_data_rejects_other_revert() {
        // Error(string) selector
        let revert = [0x08, 0xc3, 0x79, 0xa0, 0, 0, 0, 0];
        let result = RetryableData::from_revert_data(&revert);
        assert!(matches!(result, Err(RetryableError::NoRetryableData(_))));
    }

    #[test]
    fn test_request_parts() {
        let request = TransactionRequest::default()
            .with_to(Address::repeat_byte(0x42))
            .with_input(Bytes::from(vec![1, 2, 3]))
            .with_value(U256::from(77u64));

        let (to, data, value) = request_parts(&request).unwrap();
        assert_eq!(to, Address::repeat_byte(0x42));
        assert_eq!(data.as_ref(), &[1, 2, 3]);
        assert_eq!(value, U256::from(77u64));
    }

    #[test]
    fn test_request_parts_requires_target() {
        assert!(request_parts(&TransactionRequest::default()).is_err());
    }

    #[test]
    fn test_with_overrides() {
        let provider = alloy::providers::ProviderBuilder::new()
            .on_http("http://localhost:8547".parse().unwrap());
        let overrides = GasOverrides {
            gas_limit_percent_increase: 20,
            min_gas_limit: U256::from(300_000u64),
            ..Default::default()
        };

        let estimator = RetryableGasEstimator::new(provider.clone());
        assert_eq!(estimator.overrides, GasOverrides::default());

        let estimator = RetryableGasEstimator::new(provider).with_overrides(overrides);
        assert_eq!(estimator.overrides, overrides);
    }
}
