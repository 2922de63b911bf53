use crate::config::ChainParams;
use crate::indexer::{ExplorerTx, ExplorerTxIo};
use crate::wallet::{AddressPathIndex, HistoricalTx, HistoricalTxType};
use tracing::debug;

/// Label shown in place of script (contract) output addresses.
pub const CONTRACT_LABEL: &str = "Contract";

/// Turns raw explorer transactions into wallet-relative history entries.
#[derive(Debug, Clone)]
pub struct TxClassifier {
	chain: ChainParams,
}

impl TxClassifier {
	pub fn new(chain: ChainParams) -> Self {
		Self { chain }
	}

	/// Classify one transaction against the wallet's addresses.
	///
	/// Returns `None` when the transaction moves nothing from the wallet's point of view.
	pub fn classify(&self, tx: &ExplorerTx, index: &AddressPathIndex) -> Option<HistoricalTx> {
		let delta = owned_sum(&tx.vout, index) - owned_sum(&tx.vin, index);
		let shielded = tx.shield_outputs.is_some();
		let shield_balance = tx.value_balance_sat.unwrap_or(delta);

		let senders: Vec<String> = tx
			.vin
			.iter()
			.flat_map(|input| input.addresses().iter().cloned())
			.collect();
		let receivers: Vec<String> = tx
			.vout
			.iter()
			.flat_map(|output| output.addresses().iter())
			.map(|address| {
				if address.starts_with(self.chain.contract_prefix) {
					CONTRACT_LABEL.to_string()
				} else {
					address.clone()
				}
			})
			.collect();

		let is_coinstake = tx
			.vout
			.first()
			.and_then(|output| output.addresses().first())
			.is_some_and(|address| address.starts_with(self.chain.coinstake_marker));

		let mut delegated: i64 = 0;
		let mut delegation_target: Option<String> = None;

		let (tx_type, amount) = if !shielded && is_coinstake {
			(HistoricalTxType::Stake, delta)
		} else if delta > 0 {
			let amount = if shielded { shield_balance } else { delta };
			(HistoricalTxType::Received, amount)
		} else if delta < 0 {
			for input in &tx.vin {
				if self.is_staking_io(input) {
					delegated -= input.value() as i64;
				}
			}
			for output in &tx.vout {
				if let Some(address) = output
					.addresses()
					.iter()
					.find(|address| address.starts_with(self.chain.staking_prefix))
				{
					delegation_target = Some(address.clone());
					delegated += output.value() as i64;
				}
			}

			if delegated > 0 {
				(HistoricalTxType::Delegation, delegated)
			} else if delegated < 0 {
				(HistoricalTxType::Undelegation, delegated)
			} else {
				let amount = if shielded { shield_balance } else { delta };
				(HistoricalTxType::Sent, amount)
			}
		} else {
			(HistoricalTxType::Unknown, delta)
		};

		let amount_sats = amount.unsigned_abs();
		if amount_sats == 0 {
			debug!("Skipping {} with no net effect on the wallet", tx.txid);
			return None;
		}

		let receivers = match delegation_target {
			Some(target) if delegated != 0 => vec![target],
			_ => receivers,
		};

		Some(HistoricalTx {
			tx_type,
			id: tx.txid.clone(),
			senders,
			receivers,
			shielded_outputs: shielded,
			time: tx.block_time,
			block_height: tx.confirmed_height(),
			amount_sats,
		})
	}

	/// Classify a page of transactions, keeping the explorer's order.
	pub fn classify_batch(&self, txs: &[ExplorerTx], index: &AddressPathIndex) -> Vec<HistoricalTx> {
		txs.iter().filter_map(|tx| self.classify(tx, index)).collect()
	}

	fn is_staking_io(&self, io: &ExplorerTxIo) -> bool {
		io.addresses()
			.iter()
			.any(|address| address.starts_with(self.chain.staking_prefix))
	}
}

/// Sum of the entries that pay to or spend from one of the wallet's addresses.
fn owned_sum(entries: &[ExplorerTxIo], index: &AddressPathIndex) -> i64 {
	entries
		.iter()
		.filter(|entry| index.owns_any(entry.addresses()))
		.map(|entry| entry.value() as i64)
		.sum()
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	const OURS: &str = "DOwnedAddress1";
	const OTHER: &str = "DForeignAddress";
	const STAKER: &str = "SColdStaker111";

	fn classifier() -> TxClassifier {
		TxClassifier::new(ChainParams::MAINNET)
	}

	fn index() -> AddressPathIndex {
		let mut index = AddressPathIndex::new();
		index.insert(OURS, "m/44'/119'/0'/0/0");
		index
	}

	fn tx(value: serde_json::Value) -> ExplorerTx {
		serde_json::from_value(value).unwrap()
	}

	#[test]
	fn test_received() {
		let raw = tx(json!({
			"txid": "aa",
			"blockHeight": 100,
			"blockTime": 1_700_000_000,
			"vin": [{ "addresses": [OTHER], "value": "600000000" }],
			"vout": [
				{ "addresses": [OURS], "value": "500000000" },
				{ "addresses": [OTHER], "value": "90000000" }
			]
		}));

		let entry = classifier().classify(&raw, &index()).unwrap();
		assert_eq!(entry.tx_type, HistoricalTxType::Received);
		assert_eq!(entry.amount(), 5.0);
		assert_eq!(entry.block_height, Some(100));
		assert_eq!(entry.senders, vec![OTHER]);
	}

	#[test]
	fn test_stake() {
		let raw = tx(json!({
			"txid": "bb",
			"vin": [{ "addresses": [OURS], "value": "1000000000" }],
			"vout": [
				{ "addresses": ["CoinStake TX"], "value": "0" },
				{ "addresses": [OURS], "value": "1200000000" }
			]
		}));

		let entry = classifier().classify(&raw, &index()).unwrap();
		assert_eq!(entry.tx_type, HistoricalTxType::Stake);
		assert_eq!(entry.amount_sats, 200_000_000);
	}

	#[test]
	fn test_delegation() {
		let raw = tx(json!({
			"txid": "cc",
			"vin": [{ "addresses": [OURS], "value": "300000000" }],
			"vout": [{ "addresses": [STAKER, OTHER], "value": "300000000" }]
		}));

		let entry = classifier().classify(&raw, &index()).unwrap();
		assert_eq!(entry.tx_type, HistoricalTxType::Delegation);
		assert_eq!(entry.amount(), 3.0);
		assert_eq!(entry.receivers, vec![STAKER]);
	}

	#[test]
	fn test_undelegation() {
		let raw = tx(json!({
			"txid": "dd",
			"vin": [{ "addresses": [STAKER, OURS], "value": "400000000" }],
			"vout": [
				{ "addresses": [OURS], "value": "100000000" },
				{ "addresses": [OTHER], "value": "299990000" }
			]
		}));

		let entry = classifier().classify(&raw, &index()).unwrap();
		assert_eq!(entry.tx_type, HistoricalTxType::Undelegation);
		assert_eq!(entry.amount_sats, 400_000_000);
		assert_eq!(entry.receivers, vec![OURS, OTHER]);
	}

	#[test]
	fn test_zero_delta_is_discarded() {
		let raw = tx(json!({
			"txid": "ee",
			"vin": [{ "addresses": [OURS], "value": "100000000" }],
			"vout": [{ "addresses": [OURS], "value": "100000000" }]
		}));
		assert!(classifier().classify(&raw, &index()).is_none());
	}

	#[test]
	fn test_sent_to_contract() {
		let raw = tx(json!({
			"txid": "ff",
			"blockHeight": -1,
			"vin": [{ "addresses": [OURS], "value": "200000000" }],
			"vout": [
				{ "addresses": ["OP_RETURN 6a"], "value": "0" },
				{ "addresses": [OTHER], "value": "150000000" }
			]
		}));

		let entry = classifier().classify(&raw, &index()).unwrap();
		assert_eq!(entry.tx_type, HistoricalTxType::Sent);
		assert_eq!(entry.amount_sats, 200_000_000);
		assert_eq!(entry.receivers, vec![CONTRACT_LABEL, OTHER]);
		assert_eq!(entry.block_height, None);
	}

	#[test]
	fn test_shielded_amounts_use_value_balance() {
		let sent = tx(json!({
			"txid": "11",
			"shielOuts": 1,
			"valueBalanceSat": "-250000000",
			"vin": [{ "addresses": [OURS], "value": "300000000" }],
			"vout": [{ "addresses": [OURS], "value": "49990000" }]
		}));
		let entry = classifier().classify(&sent, &index()).unwrap();
		assert_eq!(entry.tx_type, HistoricalTxType::Sent);
		assert!(entry.shielded_outputs);
		assert_eq!(entry.amount_sats, 250_000_000);

		let received = tx(json!({
			"txid": "22",
			"shielOuts": 0,
			"valueBalanceSat": 70000000,
			"vin": [],
			"vout": [{ "addresses": [OURS], "value": "70000000" }]
		}));
		let entry = classifier().classify(&received, &index()).unwrap();
		assert_eq!(entry.tx_type, HistoricalTxType::Received);
		assert_eq!(entry.amount_sats, 70_000_000);
	}

	#[test]
	fn test_shielded_coinstake_is_not_a_stake() {
		let raw = tx(json!({
			"txid": "33",
			"shielOuts": 2,
			"valueBalanceSat": "100000000",
			"vin": [],
			"vout": [{ "addresses": ["CoinStake"], "value": "0" }, { "addresses": [OURS], "value": "100000000" }]
		}));
		let entry = classifier().classify(&raw, &index()).unwrap();
		assert_eq!(entry.tx_type, HistoricalTxType::Received);
	}

	#[test]
	fn test_batch_filters_and_keeps_order() {
		let txs = vec![
			tx(json!({ "txid": "a", "vout": [{ "addresses": [OURS], "value": "1" }] })),
			tx(json!({ "txid": "b", "vout": [{ "addresses": [OTHER], "value": "1" }] })),
			tx(json!({ "txid": "c", "vout": [{ "addresses": [OURS], "value": "2" }] })),
		];
		let ids: Vec<String> = classifier()
			.classify_batch(&txs, &index())
			.into_iter()
			.map(|entry| entry.id)
			.collect();
		assert_eq!(ids, vec!["a", "c"]);
	}
}
