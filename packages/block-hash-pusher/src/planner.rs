//! Fee/gas planner
//!
//! | custom fee | manual redeem | plan                                        |
//! |------------|---------------|---------------------------------------------|
//! | yes        | yes           | all zero, no approval                       |
//! | yes        | no            | approve fee token, full estimate            |
//! | no         | yes           | estimate, keep only the submission cost     |
//! | no         | no            | full estimate                               |

use alloy::primitives::Address;
use eyre::{eyre, Result};
use tracing::{debug, info};

use retryables_rs::evm::tokens::is_unlimited;
use retryables_rs::GasParams;

use crate::backend::PushBackend;
use crate::push::PushCall;

/// How the gas parameters of a push are obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeePlan {
    /// No estimation; the ticket is created unfunded and redeemed manually
    Zero,
    /// Pay the submission cost only; the ticket is redeemed manually
    SubmissionOnly,
    /// Pay for submission and auto-redeem
    Full,
}

impl FeePlan {
    pub fn select(is_custom_fee: bool, manual_redeem: bool) -> Self {
        match (is_custom_fee, manual_redeem) {
            (true, true) => FeePlan::Zero,
            (false, true) => FeePlan::SubmissionOnly,
            (_, false) => FeePlan::Full,
        }
    }

    /// Apply the plan to full estimates
    pub fn apply(self, estimates: GasParams) -> GasParams {
        match self {
            FeePlan::Zero => GasParams::zero(),
            FeePlan::SubmissionOnly => estimates.submission_only(),
            FeePlan::Full => estimates,
        }
    }
}

/// Produce the gas parameters for a push
///
/// `native_token` is required when the call targets a custom fee chain and
/// auto-redeem is requested.
pub async fn plan_fees<B>(
    backend: &B,
    call: &PushCall,
    manual_redeem: bool,
    native_token: Option<Address>,
) -> Result<GasParams>
where
    B: PushBackend + ?Sized,
{
    let plan = FeePlan::select(call.is_custom_fee, manual_redeem);
    debug!(?plan, "Selected fee plan");

    if plan == FeePlan::Zero {
        return Ok(GasParams::zero());
    }

    if call.is_custom_fee {
        let token = native_token.ok_or_else(|| eyre!("Custom fee chain has no native token"))?;
        ensure_fee_token_approval(backend, token).await?;
    }

    let estimates = plan.apply(backend.estimate_push(call).await?);
    info!(
        max_submission_cost = %estimates.max_submission_cost,
        max_fee_per_gas = %estimates.max_fee_per_gas,
        gas_limit = %estimates.gas_limit,
        deposit = %estimates.deposit,
        "Planned push fees"
    );
    Ok(estimates)
}

/// Approve the pusher for an unlimited amount of the fee token, unless it already is
pub async fn ensure_fee_token_approval<B>(backend: &B, token: Address) -> Result<()>
where
    B: PushBackend + ?Sized,
{
    let allowance = backend.fee_token_allowance(token).await?;
    if is_unlimited(allowance) {
        debug!(token = %token, "Pusher already approved");
        return Ok(());
    }

    let tx_hash = backend.send_fee_token_approval(token).await?;
    info!("Approving Pusher contract {}", tx_hash);

    let receipt = backend.confirm_parent_transaction(tx_hash).await?;
    if !receipt.status {
        return Err(eyre!("Fee token approval {} reverted", tx_hash));
    }
    info!("Pusher contract approved");
    Ok(())
}
