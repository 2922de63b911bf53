//! The key capability the coordinator queries for wallet identity.

use super::types::WalletSyncError;
use async_trait::async_trait;

/// Source of addresses and extended public keys for the active wallet.
///
/// Key derivation and signing live behind this trait; the sync engine only needs public data.
#[async_trait]
pub trait MasterKey: Send + Sync {
	/// Hierarchical-deterministic wallet.
	fn is_hd(&self) -> bool;

	/// Keys are held by a hardware device.
	fn is_hardware_wallet(&self) -> bool;

	/// Primary receiving address.
	async fn get_address(&self) -> Result<String, WalletSyncError>;

	/// Extended public key at `path`.
	async fn get_xpub(&self, path: &str) -> Result<String, WalletSyncError>;

	/// Public fingerprint of the wallet; a change means a different wallet was loaded.
	async fn key_to_export(&self) -> Result<String, WalletSyncError>;
}

/// Public-only key: one address, or an account-level xpub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOnlyKey {
	Address(String),
	Xpub { xpub: String, hardware: bool },
}

#[async_trait]
impl MasterKey for WatchOnlyKey {
	fn is_hd(&self) -> bool {
		matches!(self, WatchOnlyKey::Xpub { .. })
	}

	fn is_hardware_wallet(&self) -> bool {
		matches!(self, WatchOnlyKey::Xpub { hardware: true, .. })
	}

	async fn get_address(&self) -> Result<String, WalletSyncError> {
		match self {
			WatchOnlyKey::Address(address) => Ok(address.clone()),
			WatchOnlyKey::Xpub { .. } => Err(WalletSyncError::KeyError(
				"Watch-only xpub cannot derive addresses".to_string(),
			)),
		}
	}

	/// The account xpub is the only one available, whatever path is asked for.
	async fn get_xpub(&self, _path: &str) -> Result<String, WalletSyncError> {
		match self {
			WatchOnlyKey::Xpub { xpub, .. } => Ok(xpub.clone()),
			WatchOnlyKey::Address(_) => Err(WalletSyncError::KeyError(
				"Single-address key has no xpub".to_string(),
			)),
		}
	}

	async fn key_to_export(&self) -> Result<String, WalletSyncError> {
		match self {
			WatchOnlyKey::Address(key) | WatchOnlyKey::Xpub { xpub: key, .. } => Ok(key.clone()),
		}
	}
}
