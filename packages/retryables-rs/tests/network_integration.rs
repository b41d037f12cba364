//! Network and Estimation Integration Test
//!
//! Reads the bridge contracts behind a rollup inbox and estimates retryable
//! gas parameters against a running parent/child chain pair.
//!
//! ## Setup
//!
//! Requires a parent chain and a rollup child chain (e.g. nitro-testnode).
//! Set these environment variables:
//!
//! - `PARENT_RPC_URL` - Parent chain RPC (e.g., http://localhost:8545)
//! - `CHILD_RPC_URL` - Child chain RPC (e.g., http://localhost:8547)
//! - `TEST_INBOX_ADDRESS` - The child chain's delayed inbox on the parent chain
//!
//! ## Running
//!
//! ```bash
//! cd packages/retryables-rs
//! cargo test --test network_integration -- --ignored --nocapture
//! ```

use alloy::{
    primitives::{Address, U256},
    providers::{Provider, ProviderBuilder},
};
use retryables_rs::estimator::{get_base_fee, RetryableGasEstimator};
use retryables_rs::evm::queries::{get_eth_bridge, get_native_token};
use retryables_rs::evm::HttpProvider;
use retryables_rs::{add_custom_network, get_child_network, ChildNetwork, RetryableError};
use std::str::FromStr;

struct TestContext {
    parent: HttpProvider,
    child: HttpProvider,
    inbox: Address,
}

impl TestContext {
    /// Setup: load endpoints from env
    fn setup() -> Result<Self, String> {
        let parent_url = std::env::var("PARENT_RPC_URL").map_err(|_| "PARENT_RPC_URL not set")?;
        let child_url = std::env::var("CHILD_RPC_URL").map_err(|_| "CHILD_RPC_URL not set")?;
        let inbox_str =
            std::env::var("TEST_INBOX_ADDRESS").map_err(|_| "TEST_INBOX_ADDRESS not set")?;
        let inbox = Address::from_str(&inbox_str)
            .map_err(|e| format!("Invalid TEST_INBOX_ADDRESS: {}", e))?;

        let parent = ProviderBuilder::new().on_http(
            parent_url
                .parse()
                .map_err(|e| format!("Invalid PARENT_RPC_URL: {}", e))?,
        );
        let child = ProviderBuilder::new().on_http(
            child_url
                .parse()
                .map_err(|e| format!("Invalid CHILD_RPC_URL: {}", e))?,
        );

        tracing::info!(parent = %parent_url, child = %child_url, inbox = %inbox, "Test context ready");
        Ok(Self {
            parent,
            child,
            inbox,
        })
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .ok();
}

#[tokio::test]
#[ignore = "requires PARENT_RPC_URL, CHILD_RPC_URL, TEST_INBOX_ADDRESS"]
async fn test_register_network_from_inbox() {
    init_tracing();
    let ctx = match TestContext::setup() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Skipping: {}", e);
            return;
        }
    };

    let eth_bridge = get_eth_bridge(&ctx.parent, ctx.inbox)
        .await
        .expect("bridge contracts should be readable");
    assert_eq!(eth_bridge.inbox, ctx.inbox);
    assert_ne!(eth_bridge.bridge, Address::ZERO);
    assert_ne!(eth_bridge.rollup, Address::ZERO);

    // Fails on ETH-fee bridges, which lack nativeToken()
    let native_token = get_native_token(&ctx.parent, eth_bridge.bridge).await.ok();

    let parent_chain_id = ctx.parent.get_chain_id().await.expect("parent chain id");
    let child_chain_id = ctx.child.get_chain_id().await.expect("child chain id");

    let child = ChildNetwork::custom(child_chain_id, parent_chain_id, eth_bridge, native_token);
    match add_custom_network(None, child.clone()) {
        Ok(()) | Err(RetryableError::NetworkAlreadyIncluded(_)) => {}
        Err(e) => panic!("registration failed: {}", e),
    }
    assert_eq!(get_child_network(child_chain_id), Some(child));
}

#[tokio::test]
#[ignore = "requires PARENT_RPC_URL, CHILD_RPC_URL, TEST_INBOX_ADDRESS"]
async fn test_fee_estimates_are_positive() {
    init_tracing();
    let ctx = match TestContext::setup() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Skipping: {}", e);
            return;
        }
    };

    let base_fee = get_base_fee(&ctx.parent).await.expect("parent base fee");
    assert!(base_fee > U256::ZERO);

    let estimator = RetryableGasEstimator::new(ctx.child.clone());
    let max_fee_per_gas = estimator
        .estimate_max_fee_per_gas()
        .await
        .expect("max fee per gas");
    assert!(max_fee_per_gas > U256::ZERO);

    let submission_fee = estimator
        .estimate_submission_fee(&ctx.parent, ctx.inbox, base_fee, 100)
        .await
        .expect("submission fee");
    assert!(submission_fee > U256::ZERO);
}
