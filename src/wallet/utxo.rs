//! Spendable outputs resolved from explorer data.

use super::address_index::with_coin_type;
use crate::config::COIN;
use crate::indexer::{LiteUtxo, SpecificTx};
use serde::{Deserialize, Serialize};

/// Confirmation state of an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UtxoStatus {
	/// In the mempool; the height is a projection.
	Pending,
	Confirmed,
}

/// Inputs needed to turn a lite UTXO into a full one.
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentContext {
	/// Chain tip the confirmation count is measured against.
	pub cached_height: u64,
	/// BIP44 coin type matching the wallet's signer.
	pub coin_type: u32,
}

/// A spendable output owned by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
	/// The transaction hash.
	pub id: String,
	/// Derivation path of the receiving address, for HD wallets.
	pub path: Option<String>,
	/// Value in satoshis.
	pub sats: u64,
	/// Output script, hex encoded.
	pub script: String,
	/// Output index.
	pub vout: u32,
	pub height: u64,
	pub status: UtxoStatus,
	/// Cold-staking (delegated) output.
	pub is_delegate: bool,
	/// Output of a coinstake or coinbase transaction.
	pub is_reward: bool,
}

impl Utxo {
	/// Resolve `lite` against its owning transaction.
	///
	/// Returns `None` when no output carries index `lite.vout`, or when the output is neither
	/// pay-to-pubkey-hash nor cold-staking, since the wallet cannot spend it.
	pub fn from_specific_tx(
		lite: &LiteUtxo,
		tx: &SpecificTx,
		context: &EnrichmentContext,
	) -> Option<Self> {
		let output = tx.vout.iter().find(|output| output.n == lite.vout)?;

		let is_delegate = output.script_pub_key.script_type == "coldstake";
		let is_standard = output.script_pub_key.script_type == "pubkeyhash";
		if !is_delegate && !is_standard {
			return None;
		}

		let is_reward = tx
			.vout
			.first()
			.is_some_and(|first| first.script_pub_key.hex.is_empty());

		Some(Self {
			id: lite.txid.clone(),
			path: lite
				.path
				.as_deref()
				.map(|path| with_coin_type(path, context.coin_type)),
			sats: (output.value * COIN as f64).round() as u64,
			script: output.script_pub_key.hex.clone(),
			vout: output.n,
			height: (context.cached_height + 1).saturating_sub(tx.confirmations),
			status: if tx.confirmations < 1 {
				UtxoStatus::Pending
			} else {
				UtxoStatus::Confirmed
			},
			is_delegate,
			is_reward,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn specific_tx(confirmations: u64, outputs: serde_json::Value) -> SpecificTx {
		serde_json::from_value(json!({
			"txid": "ab".repeat(32),
			"confirmations": confirmations,
			"vout": outputs,
		}))
		.unwrap()
	}

	fn lite(vout: u32, path: Option<&str>) -> LiteUtxo {
		LiteUtxo {
			txid: "ab".repeat(32),
			vout,
			value: 0,
			height: None,
			confirmations: 0,
			path: path.map(str::to_string),
			address: None,
		}
	}

	const CONTEXT: EnrichmentContext = EnrichmentContext {
		cached_height: 1000,
		coin_type: 77,
	};

	#[test]
	fn test_standard_output_is_enriched() {
		let tx = specific_tx(
			3,
			json!([
				{ "value": 1.5, "n": 0, "scriptPubKey": { "hex": "76a914aa88ac", "type": "pubkeyhash" } }
			]),
		);

		let utxo = Utxo::from_specific_tx(&lite(0, Some("m/44'/119'/0'/0/4")), &tx, &CONTEXT).unwrap();

		assert_eq!(utxo.sats, 150_000_000);
		assert_eq!(utxo.height, 998);
		assert_eq!(utxo.status, UtxoStatus::Confirmed);
		assert_eq!(utxo.path.as_deref(), Some("m/44'/77'/0'/0/4"));
		assert!(!utxo.is_delegate);
		assert!(!utxo.is_reward);
	}

	#[test]
	fn test_coinstake_delegation_output() {
		let tx = specific_tx(
			0,
			json!([
				{ "value": 0.0, "n": 0, "scriptPubKey": { "hex": "", "type": "nonstandard" } },
				{ "value": 10.0, "n": 1, "scriptPubKey": { "hex": "76a97b63d114aa", "type": "coldstake" } }
			]),
		);

		let utxo = Utxo::from_specific_tx(&lite(1, None), &tx, &CONTEXT).unwrap();

		assert!(utxo.is_delegate);
		assert!(utxo.is_reward);
		assert_eq!(utxo.status, UtxoStatus::Pending);
		assert_eq!(utxo.height, 1001);
		assert_eq!(utxo.path, None);
	}

	#[test]
	fn test_unsupported_script_is_ignored() {
		let tx = specific_tx(
			5,
			json!([
				{ "value": 1.0, "n": 0, "scriptPubKey": { "hex": "6a04deadbeef", "type": "nulldata" } }
			]),
		);
		assert!(Utxo::from_specific_tx(&lite(0, None), &tx, &CONTEXT).is_none());
		assert!(Utxo::from_specific_tx(&lite(3, None), &tx, &CONTEXT).is_none());
	}

	#[test]
	fn test_output_is_matched_by_index_not_position() {
		// Pruned detail: only output 1 is present, at position 0.
		let tx = specific_tx(
			2,
			json!([
				{ "value": 4.0, "n": 1, "scriptPubKey": { "hex": "76a914bb88ac", "type": "pubkeyhash" } }
			]),
		);

		assert!(Utxo::from_specific_tx(&lite(0, None), &tx, &CONTEXT).is_none());
		let utxo = Utxo::from_specific_tx(&lite(1, None), &tx, &CONTEXT).unwrap();
		assert_eq!(utxo.sats, 400_000_000);
	}
}
