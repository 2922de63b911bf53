//! Chain parameters and runtime configuration for the explorer sync service.
//!
//! `ExplorerConfig::from_env` is the single entry point used by the binary; library users
//! can build the structs directly and rely on the `Default` impls.

use std::env;
use std::time::Duration;
use tracing::{info, warn};

/// Satoshis per whole coin.
pub const COIN: u64 = 100_000_000;

/// Number of decimal places of the native coin.
pub const COIN_DECIMALS: u32 = 8;

/// Which chain the wallet lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
	Mainnet,
	Testnet,
}

/// Static per-network parameters used when classifying and enriching explorer data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
	pub network: NetworkKind,
	/// Prefix of cold-staking (delegation) addresses.
	pub staking_prefix: &'static str,
	/// BIP44 coin type for software wallets.
	pub bip44_type: u32,
	/// BIP44 coin type used by hardware wallets.
	pub bip44_type_ledger: u32,
	/// Address label the explorer reports for the empty coinstake marker output.
	pub coinstake_marker: &'static str,
	/// Address label prefix the explorer uses for script (contract) outputs.
	pub contract_prefix: &'static str,
	/// Explorer used when no URL is configured.
	pub default_explorer_url: &'static str,
}

impl ChainParams {
	pub const MAINNET: ChainParams = ChainParams {
		network: NetworkKind::Mainnet,
		staking_prefix: "S",
		bip44_type: 119,
		bip44_type_ledger: 77,
		coinstake_marker: "CoinStake",
		contract_prefix: "OP_",
		default_explorer_url: "https://explorer.rockdev.org",
	};

	pub const TESTNET: ChainParams = ChainParams {
		network: NetworkKind::Testnet,
		staking_prefix: "W",
		bip44_type: 1,
		bip44_type_ledger: 1,
		coinstake_marker: "CoinStake",
		contract_prefix: "OP_",
		default_explorer_url: "https://testnet.rockdev.org",
	};

	pub fn for_network(network: NetworkKind) -> Self {
		match network {
			NetworkKind::Mainnet => Self::MAINNET,
			NetworkKind::Testnet => Self::TESTNET,
		}
	}

	/// BIP44 coin type matching the kind of signer.
	pub fn coin_type(&self, is_hardware_wallet: bool) -> u32 {
		if is_hardware_wallet {
			self.bip44_type_ledger
		} else {
			self.bip44_type
		}
	}

	/// Full derivation path of the first receiving address.
	pub fn derivation_path(&self, is_hardware_wallet: bool) -> String {
		format!("m/44'/{}'/0'/0/0", self.coin_type(is_hardware_wallet))
	}

	/// Account-level path (depth 4) whose xpub the explorer is queried with.
	pub fn account_path(&self, is_hardware_wallet: bool) -> String {
		self.derivation_path(is_hardware_wallet)
			.split('/')
			.take(4)
			.collect::<Vec<_>>()
			.join("/")
	}
}

impl Default for ChainParams {
	fn default() -> Self {
		Self::MAINNET
	}
}

/// Knobs of the incremental history sync.
#[derive(Debug, Clone)]
pub struct SyncConfig {
	/// Transactions requested per history page.
	pub page_size: u32,
	/// Depth below the tip re-scanned on every chunk for newly arrived transactions.
	pub recent_window: u64,
	/// Spacing between block-height polls of the runner loop.
	pub poll_interval: Duration,
}

impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			page_size: 200,
			recent_window: 60,
			poll_interval: Duration::from_secs(15),
		}
	}
}

/// Explorer endpoint and transport settings.
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
	pub chain: ChainParams,
	/// Base URL of the Blockbook explorer, without trailing slash.
	pub explorer_url: String,
	/// Per-request timeout.
	pub request_timeout: Duration,
	/// Upper bound on the time spent retrying a failed idempotent request.
	pub retry_max_elapsed: Duration,
	pub sync: SyncConfig,
}

impl ExplorerConfig {
	/// Load configuration from environment variables
	///
	/// - `EXPLORER_NETWORK`: "mainnet" (default) or "testnet"
	/// - `EXPLORER_URL`: Blockbook base URL (network default otherwise)
	/// - `EXPLORER_PAGE_SIZE`: history page size
	/// - `EXPLORER_POLL_SECS`: block-height poll interval
	/// - `EXPLORER_TIMEOUT_SECS`: HTTP request timeout
	/// - `EXPLORER_RETRY_SECS`: max elapsed time for transient retries
	pub fn from_env() -> Self {
		let network_str = env::var("EXPLORER_NETWORK")
			.unwrap_or_else(|_| "mainnet".to_string())
			.to_lowercase();

		let network = match network_str.as_str() {
			"mainnet" | "" => NetworkKind::Mainnet,
			"testnet" => NetworkKind::Testnet,
			other => {
				warn!("Unknown network '{}', defaulting to mainnet", other);
				NetworkKind::Mainnet
			}
		};
		let chain = ChainParams::for_network(network);

		let explorer_url = env::var("EXPLORER_URL")
			.map(|url| url.trim_end_matches('/').to_string())
			.unwrap_or_else(|_| chain.default_explorer_url.to_string());
		info!("Explorer URL: {} ({:?})", explorer_url, network);

		let defaults = SyncConfig::default();
		let sync = SyncConfig {
			page_size: env_number("EXPLORER_PAGE_SIZE").unwrap_or(defaults.page_size),
			recent_window: defaults.recent_window,
			poll_interval: env_number("EXPLORER_POLL_SECS")
				.map(Duration::from_secs)
				.unwrap_or(defaults.poll_interval),
		};

		Self {
			chain,
			explorer_url,
			request_timeout: Duration::from_secs(env_number("EXPLORER_TIMEOUT_SECS").unwrap_or(30)),
			retry_max_elapsed: Duration::from_secs(env_number("EXPLORER_RETRY_SECS").unwrap_or(10)),
			sync,
		}
	}
}

impl Default for ExplorerConfig {
	fn default() -> Self {
		Self {
			chain: ChainParams::MAINNET,
			explorer_url: ChainParams::MAINNET.default_explorer_url.to_string(),
			request_timeout: Duration::from_secs(30),
			retry_max_elapsed: Duration::from_secs(10),
			sync: SyncConfig::default(),
		}
	}
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
	let raw = env::var(key).ok()?;
	match raw.trim().parse() {
		Ok(value) => Some(value),
		Err(_) => {
			warn!("Ignoring non-numeric {}='{}'", key, raw);
			None
		}
	}
}
