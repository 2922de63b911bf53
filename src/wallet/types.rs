use crate::indexer::IndexerError;

/// Error types for wallet synchronization against the explorer
#[allow(clippy::enum_variant_names)]
#[derive(Debug, thiserror::Error)]
pub enum WalletSyncError {
	#[error("Indexer error: {0}")]
	IndexerError(#[from] IndexerError),

	#[error("Explorer backend is disabled")]
	BackendDisabled,

	#[error("No wallet key loaded")]
	NoMasterKey,

	#[error("Key error: {0}")]
	KeyError(String),

	#[error("Invalid transaction hex: {0}")]
	InvalidTransactionHex(#[from] hex::FromHexError),

	#[error("Broadcast error: {0}")]
	Broadcast(String),
}

impl WalletSyncError {
	/// Whether this failure came from the explorer transport and should disable the backend.
	pub fn is_network(&self) -> bool {
		matches!(self, WalletSyncError::IndexerError(e) if e.is_network())
	}
}
