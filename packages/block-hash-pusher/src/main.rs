//! Block Hash Pusher
//!
//! Pushes the hashes of the most recent parent chain blocks to the child
//! chain's buffer through the pusher contract, then makes sure the resulting
//! retryable ticket is redeemed.
//!
//! # Flow
//!
//! 1. Skip if the pusher emitted `BlockHashesPushed` within `--min-elapsed` blocks
//! 2. Register the child network behind `<inbox>` if needed
//! 3. Plan fees (approving the fee token on custom fee chains)
//! 4. Send `pushHashes` on the parent chain
//! 5. Wait for the ticket; redeem manually unless it was auto-redeemed

use alloy::primitives::{Address, U256};
use clap::Parser;
use tracing::info;

use pusher::{push, Config, EvmPushBackend, PushOutcome, PushRequest};

#[derive(Parser, Debug)]
#[command(name = "block-hash-pusher")]
#[command(about = "Push parent chain block hashes to a child chain buffer", long_about = None)]
struct Cli {
    /// The inbox address to push through
    inbox: Address,

    /// The number of blocks to push
    num_blocks: U256,

    /// The minimum number of elapsed blocks since the last push.
    /// If a batch was pushed more recently than this, pushing will be skipped.
    /// For example, if a push was performed at block 100, latest is 110.
    /// numBlocks >= 10 will skip. If 0, disabled.
    #[arg(long, value_name = "BLOCKS")]
    min_elapsed: Option<u64>,

    /// Indicates if the child chain is a custom fee child chain
    #[arg(long)]
    is_custom_fee: bool,

    /// Disable payment for auto redeem on parent chain
    #[arg(long)]
    manual_redeem: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn request(&self) -> PushRequest {
        PushRequest {
            inbox: self.inbox,
            num_blocks: self.num_blocks,
            min_elapsed: self.min_elapsed,
            is_custom_fee: self.is_custom_fee,
            manual_redeem: self.manual_redeem,
        }
    }
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Arguments are validated before any runtime or chain access
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> eyre::Result<()> {
    init_logging(cli.verbose);

    let config = Config::load()?;
    info!(
        parent_rpc = %config.parent_rpc_url,
        child_rpc = %config.child_rpc_url,
        pusher = %config.pusher_address,
        "Configuration loaded"
    );

    let backend = EvmPushBackend::new(&config)?;
    let request = cli.request();

    match push(&backend, &request).await? {
        PushOutcome::Skipped { last_push_block } => {
            info!(last_push_block, "Push skipped");
        }
        PushOutcome::AutoRedeemed { receipt } => {
            info!(
                tx_hash = %receipt.tx_hash,
                block = receipt.block_number,
                range = ?receipt.pushed_range(),
                "Push complete"
            );
        }
        PushOutcome::ManuallyRedeemed { receipt, redeem_tx } => {
            info!(
                tx_hash = %receipt.tx_hash,
                block = receipt.block_number,
                range = ?receipt.pushed_range(),
                redeem_tx = %redeem_tx,
                "Push complete"
            );
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,block_hash_pusher=debug,pusher=debug,retryables_rs=debug")
        })
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}
