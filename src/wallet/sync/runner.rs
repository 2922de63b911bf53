//! One iteration of the background sync loop.
//!
//! A failed poll disables the backend. The loop does not stop on it: the next tick re-enables
//! the backend and tries again, so a transient outage only costs the ticks it lasts.

use super::coordinator::SyncCoordinator;
use crate::wallet::WalletSyncError;
use tracing::{info, warn};

/// Run a single sync tick.
///
/// Re-enables a disabled backend, polls the tip, and pages one more chunk of older history
/// while it is incomplete. Returns whether a new block was seen.
pub async fn run_tick(coordinator: &SyncCoordinator) -> Result<bool, WalletSyncError> {
	if !coordinator.is_enabled() {
		info!("Retrying explorer backend");
		coordinator.enable().await;
	}

	let new_block = match coordinator.poll().await {
		Ok(new_block) => new_block,
		Err(e) => {
			warn!("Sync tick failed, retrying on the next tick: {}", e);
			return Err(e);
		}
	};

	if !coordinator.is_history_synced().await {
		coordinator.sync_history_chunk(false).await;
	}
	Ok(new_block)
}
