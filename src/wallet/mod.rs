pub mod address_index;
pub mod history;
pub mod master_key;
pub mod sync;
pub mod types;
pub mod utxo;

pub use address_index::AddressPathIndex;
pub use history::{HistoricalTx, HistoricalTxType};
pub use master_key::{MasterKey, WatchOnlyKey};
pub use sync::SyncCoordinator;
pub use types::*;
pub use utxo::{EnrichmentContext, Utxo, UtxoStatus};
