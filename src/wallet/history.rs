//! User-facing transaction history records.

use crate::config::COIN;
use crate::utils::format_coin_amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a transaction did from the wallet's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoricalTxType {
	Unknown,
	Stake,
	Delegation,
	Undelegation,
	Received,
	Sent,
}

impl fmt::Display for HistoricalTxType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			HistoricalTxType::Unknown => "unknown",
			HistoricalTxType::Stake => "stake",
			HistoricalTxType::Delegation => "delegation",
			HistoricalTxType::Undelegation => "undelegation",
			HistoricalTxType::Received => "received",
			HistoricalTxType::Sent => "sent",
		};
		f.write_str(label)
	}
}

/// A classified transaction.
///
/// The amount is always the absolute value moved; direction lives in `tx_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalTx {
	pub tx_type: HistoricalTxType,
	/// The transaction hash.
	pub id: String,
	/// Input addresses.
	pub senders: Vec<String>,
	/// Output addresses, or the single delegation target.
	pub receivers: Vec<String>,
	/// The transaction creates shielded outputs.
	pub shielded_outputs: bool,
	/// Block time as a unix timestamp.
	pub time: i64,
	/// `None` while unconfirmed.
	pub block_height: Option<u64>,
	/// Absolute amount in satoshis, never zero.
	pub amount_sats: u64,
}

impl HistoricalTx {
	/// Amount in whole coins.
	pub fn amount(&self) -> f64 {
		self.amount_sats as f64 / COIN as f64
	}

	pub fn timestamp(&self) -> Option<DateTime<Utc>> {
		DateTime::from_timestamp(self.time, 0)
	}
}

impl fmt::Display for HistoricalTx {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let when = self
			.timestamp()
			.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
			.unwrap_or_else(|| "pending".to_string());
		write!(
			f,
			"{} {} {} ({})",
			when,
			self.tx_type,
			format_coin_amount(self.amount_sats),
			self.id
		)
	}
}
