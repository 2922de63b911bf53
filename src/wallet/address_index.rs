//! Address to derivation-path lookup used to decide which inputs and outputs belong to the wallet.

use crate::indexer::{HistoryPage, WalletIdentity};
use std::collections::HashMap;

/// Path recorded for the only address of a non-HD wallet.
pub const SINGLE_ADDRESS_PATH: &str = "single";

/// Maps explorer-reported addresses to HD derivation paths.
///
/// Rebuilt for every history chunk from the pages fetched in that chunk; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressPathIndex {
	paths: HashMap<String, String>,
}

impl AddressPathIndex {
	pub fn new() -> Self {
		Self::default()
	}

	/// Index holding one synthetic entry for a single-address wallet.
	pub fn single_address(address: &str) -> Self {
		let mut index = Self::new();
		index.insert(address, SINGLE_ADDRESS_PATH);
		index
	}

	/// Build the index for one sync chunk.
	///
	/// For an xpub the union of every page's derived-address tokens is used, later pages
	/// overriding earlier ones; an address identity yields the single synthetic entry.
	pub fn from_pages<'a>(
		identity: &WalletIdentity,
		pages: impl IntoIterator<Item = &'a HistoryPage>,
	) -> Self {
		match identity {
			WalletIdentity::Address(address) => Self::single_address(address),
			WalletIdentity::Xpub(_) => {
				let mut index = Self::new();
				for token in pages.into_iter().flat_map(|page| page.tokens.iter()) {
					index.insert(&token.name, token.path.as_deref().unwrap_or_default());
				}
				index
			}
		}
	}

	pub fn insert(&mut self, address: &str, path: &str) {
		self.paths.insert(address.to_string(), path.to_string());
	}

	pub fn contains(&self, address: &str) -> bool {
		self.paths.contains_key(address)
	}

	pub fn path_of(&self, address: &str) -> Option<&str> {
		self.paths.get(address).map(String::as_str)
	}

	/// True when any of the addresses belongs to the wallet.
	pub fn owns_any(&self, addresses: &[String]) -> bool {
		addresses.iter().any(|address| self.contains(address))
	}

	pub fn len(&self) -> usize {
		self.paths.len()
	}

	pub fn is_empty(&self) -> bool {
		self.paths.is_empty()
	}
}

/// Rewrite the coin-type segment (`m/44'/<type>'/...`) of a derivation path.
pub fn with_coin_type(path: &str, coin_type: u32) -> String {
	let mut segments: Vec<String> = path.split('/').map(str::to_string).collect();
	if let Some(segment) = segments.get_mut(2) {
		*segment = format!("{}'", coin_type);
	}
	segments.join("/")
}

/// Address index (sixth segment) of a full `m/44'/t'/a'/c/i` path.
pub fn address_index(path: &str) -> Option<u32> {
	path.split('/')
		.nth(5)
		.and_then(|segment| segment.trim_end_matches('\'').parse().ok())
}
