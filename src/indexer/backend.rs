//! The ledger backend capability consumed by the sync coordinator.

use super::types::*;
use crate::wallet::utxo::{EnrichmentContext, Utxo};
use async_trait::async_trait;

/// Remote ledger-indexing service.
///
/// Every method fails with a network-class `IndexerError` on transport or payload failure;
/// `broadcast` additionally fails with `IndexerError::BroadcastRejected` when the node refuses
/// the transaction. Implementations stay stateless: enable/disable bookkeeping belongs to the
/// caller.
#[async_trait]
pub trait LedgerBackend: Send + Sync {
	/// Current chain tip height.
	async fn get_block_height(&self) -> Result<u64, IndexerError>;

	/// Lite UTXOs of an address or xpub.
	async fn get_utxos(&self, key: &str) -> Result<Vec<LiteUtxo>, IndexerError>;

	/// Node-format transaction, used to resolve output scripts.
	async fn get_tx_specific(&self, txid: &str) -> Result<SpecificTx, IndexerError>;

	/// One descending-by-height page of transactions touching `identity`.
	async fn get_history_page(
		&self,
		identity: &WalletIdentity,
		query: &PageQuery,
	) -> Result<HistoryPage, IndexerError>;

	/// Submit a signed transaction, returning its txid.
	async fn broadcast(&self, raw_tx_hex: &str) -> Result<String, IndexerError>;

	/// Explorer-format transaction detail.
	async fn get_tx_detail(&self, txid: &str) -> Result<ExplorerTx, IndexerError>;

	/// Name of this backend for logging.
	fn name(&self) -> &'static str;

	/// Resolve a lite UTXO into a spendable output.
	///
	/// Returns `Ok(None)` for outputs whose script class the wallet cannot spend.
	async fn get_utxo_full_info(
		&self,
		lite: &LiteUtxo,
		context: &EnrichmentContext,
	) -> Result<Option<Utxo>, IndexerError> {
		let tx = self.get_tx_specific(&lite.txid).await?;
		Ok(Utxo::from_specific_tx(lite, &tx, context))
	}
}
