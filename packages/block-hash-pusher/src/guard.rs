//! Recency guard
//!
//! Skips a push when the pusher already emitted `BlockHashesPushed` within
//! the last `min_elapsed` parent blocks. For example, with a push at block
//! 100 and latest block 110, any `min_elapsed >= 10` skips.

use eyre::Result;
use tracing::{debug, info};

use crate::backend::PushBackend;

/// First block of the look-back window
pub fn window_start(latest_block: u64, min_elapsed: u64) -> u64 {
    latest_block.saturating_sub(min_elapsed)
}

/// Return the block of a recent push, if one exists in the window
///
/// `None` or `Some(0)` disables the guard without touching the chain.
pub async fn check_recent_push<B>(backend: &B, min_elapsed: Option<u64>) -> Result<Option<u64>>
where
    B: PushBackend + ?Sized,
{
    let Some(min_elapsed) = min_elapsed.filter(|n| *n > 0) else {
        return Ok(None);
    };

    let latest = backend.latest_parent_block().await?;
    let from_block = window_start(latest, min_elapsed);
    let pushes = backend.push_log_blocks(from_block).await?;
    debug!(latest, from_block, found = pushes.len(), "Checked recent pushes");

    match pushes.first() {
        Some(&block) => {
            info!("Skipping push, recent push found at block {}", block);
            Ok(Some(block))
        }
        None => Ok(None),
    }
}
