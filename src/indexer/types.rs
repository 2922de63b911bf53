//! Types for the Blockbook explorer REST API (`/api/v2`).

use serde::{Deserialize, Deserializer, Serialize};

/// Chain status from `/api/v2/api`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerStatus {
	pub backend: BackendStatus,
}

/// Node section of the chain status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatus {
	/// Current chain tip height known to the node.
	pub blocks: u64,
}

/// Lite UTXO as returned by `/api/v2/utxo/{key}`.
///
/// Only identifies the output; script, type and confirmation status are resolved
/// separately through the owning transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteUtxo {
	/// The transaction hash.
	pub txid: String,
	/// Output index within the transaction.
	pub vout: u32,
	/// Output value in satoshis.
	#[serde(deserialize_with = "de_sats")]
	pub value: u64,
	/// Block height, absent for mempool outputs.
	#[serde(default)]
	pub height: Option<u64>,
	#[serde(default)]
	pub confirmations: u64,
	/// Derivation path, present when the query key was an xpub.
	#[serde(default)]
	pub path: Option<String>,
	#[serde(default)]
	pub address: Option<String>,
}

/// Transaction in node format from `/api/v2/tx-specific/{txid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecificTx {
	pub txid: String,
	#[serde(default)]
	pub confirmations: u64,
	pub vout: Vec<SpecificVout>,
}

/// Output in node format; `value` is expressed in whole coins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecificVout {
	pub value: f64,
	pub n: u32,
	#[serde(rename = "scriptPubKey")]
	pub script_pub_key: ScriptPubKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptPubKey {
	#[serde(default)]
	pub hex: String,
	/// Script class as reported by the node (`pubkeyhash`, `coldstake`, ...).
	#[serde(rename = "type", default)]
	pub script_type: String,
}

/// Transaction in explorer format, as embedded in history pages and `/api/v2/tx/{txid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerTx {
	pub txid: String,
	#[serde(default)]
	pub vin: Vec<ExplorerTxIo>,
	#[serde(default)]
	pub vout: Vec<ExplorerTxIo>,
	/// Block height, `-1` for mempool transactions.
	#[serde(rename = "blockHeight", default)]
	pub block_height: i64,
	#[serde(rename = "blockTime", default)]
	pub block_time: i64,
	#[serde(default)]
	pub confirmations: u64,
	/// Number of shielded outputs; the explorer spells the field `shielOuts`.
	#[serde(
		rename = "shielOuts",
		alias = "shieldedOutputs",
		default,
		skip_serializing_if = "Option::is_none"
	)]
	pub shield_outputs: Option<u64>,
	/// Signed net value moved out of the shielded pool, in satoshis.
	#[serde(
		rename = "valueBalanceSat",
		default,
		deserialize_with = "de_opt_signed_sats",
		skip_serializing_if = "Option::is_none"
	)]
	pub value_balance_sat: Option<i64>,
}

impl ExplorerTx {
	/// Height of a confirmed transaction.
	pub fn confirmed_height(&self) -> Option<u64> {
		u64::try_from(self.block_height).ok().filter(|h| *h > 0)
	}
}

/// One input or output of an explorer transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplorerTxIo {
	#[serde(default)]
	pub addresses: Option<Vec<String>>,
	#[serde(default, deserialize_with = "de_opt_sats")]
	pub value: Option<u64>,
}

impl ExplorerTxIo {
	pub fn addresses(&self) -> &[String] {
		self.addresses.as_deref().unwrap_or_default()
	}

	pub fn value(&self) -> u64 {
		self.value.unwrap_or(0)
	}
}

/// Derived address of an xpub, with its derivation path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressToken {
	/// The address itself.
	pub name: String,
	#[serde(default)]
	pub path: Option<String>,
}

/// One page of `/api/v2/{address|xpub}/{key}?details=txs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryPage {
	#[serde(default)]
	pub page: u32,
	#[serde(rename = "totalPages", default)]
	pub total_pages: u32,
	/// Page size the explorer applied to this request.
	#[serde(rename = "itemsOnPage", default)]
	pub items_on_page: Option<u32>,
	/// Omitted by the explorer when the range holds no transactions.
	#[serde(default)]
	pub transactions: Vec<ExplorerTx>,
	/// Address to path mapping, only present for xpub queries.
	#[serde(default)]
	pub tokens: Vec<AddressToken>,
}

/// Height bounds and size of a history page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
	/// Lowest block height included.
	pub from: Option<u64>,
	/// Highest block height included.
	pub to: Option<u64>,
	pub page_size: u32,
}

/// The key the explorer is queried with: one address, or an account xpub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletIdentity {
	Address(String),
	Xpub(String),
}

impl WalletIdentity {
	pub fn as_str(&self) -> &str {
		match self {
			WalletIdentity::Address(key) | WalletIdentity::Xpub(key) => key,
		}
	}

	pub fn is_hd(&self) -> bool {
		matches!(self, WalletIdentity::Xpub(_))
	}

	/// Path segment of the history endpoint.
	pub fn endpoint(&self) -> &'static str {
		match self {
			WalletIdentity::Address(_) => "address",
			WalletIdentity::Xpub(_) => "xpub",
		}
	}
}

/// Response of `/api/v2/sendtx/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendTxResponse {
	#[serde(default)]
	pub result: Option<String>,
	#[serde(default)]
	pub error: Option<serde_json::Value>,
}

impl SendTxResponse {
	/// The broadcast txid, when the explorer accepted the transaction.
	pub fn txid(&self) -> Option<&str> {
		self.result.as_deref().filter(|txid| txid.len() == 64)
	}

	/// Rejection reason, flattened from the explorer's error payload.
	pub fn reason(&self) -> String {
		match &self.error {
			Some(serde_json::Value::String(message)) => message.clone(),
			Some(serde_json::Value::Object(map)) => map
				.get("message")
				.and_then(|m| m.as_str())
				.map(str::to_string)
				.unwrap_or_else(|| serde_json::Value::Object(map.clone()).to_string()),
			Some(other) => other.to_string(),
			None => self
				.result
				.clone()
				.unwrap_or_else(|| "Unknown broadcast error".to_string()),
		}
	}
}

/// Error types for explorer operations
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
	#[error("HTTP error: {0}")]
	HttpError(#[from] reqwest::Error),

	#[error("JSON parse error: {0}")]
	JsonError(#[from] serde_json::Error),

	#[error("Explorer error: {0}")]
	ExplorerError(String),

	#[error("Broadcast rejected: {0}")]
	BroadcastRejected(String),
}

impl IndexerError {
	/// Transport or payload failure, as opposed to a rejected transaction.
	pub fn is_network(&self) -> bool {
		!matches!(self, IndexerError::BroadcastRejected(_))
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
	Text(String),
	Unsigned(u64),
	Signed(i64),
}

impl RawAmount {
	fn signed<E: serde::de::Error>(self) -> Result<i64, E> {
		match self {
			RawAmount::Text(text) => text
				.trim()
				.parse::<i64>()
				.map_err(|_| E::custom(format!("invalid amount '{}'", text))),
			RawAmount::Unsigned(value) => i64::try_from(value).map_err(E::custom),
			RawAmount::Signed(value) => Ok(value),
		}
	}

	fn unsigned<E: serde::de::Error>(self) -> Result<u64, E> {
		let value = self.signed::<E>()?;
		u64::try_from(value).map_err(|_| E::custom(format!("negative amount {}", value)))
	}
}

fn de_sats<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
	RawAmount::deserialize(deserializer)?.unsigned()
}

fn de_opt_sats<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
	Option::<RawAmount>::deserialize(deserializer)?
		.map(RawAmount::unsigned)
		.transpose()
}

fn de_opt_signed_sats<'de, D: Deserializer<'de>>(
	deserializer: D,
) -> Result<Option<i64>, D::Error> {
	Option::<RawAmount>::deserialize(deserializer)?
		.map(RawAmount::signed)
		.transpose()
}
