//! Explorer sync coordinator.
//!
//! This module defines the `SyncCoordinator`, which owns the wallet-facing state derived from the
//! explorer: the cached chain tip, the UTXO snapshot, and the classified transaction timeline.
//!
//! The coordinator is responsible for:
//! - Polling the chain tip and refreshing wallet state when a new block arrives
//! - Paging transaction history through a recent and a historical height window
//! - Serializing wallet UTXO refreshes and history chunks with single-slot guards
//! - Disabling the backend after a transport failure until it is explicitly re-enabled
//! - Publishing typed events to the registered handlers
//!
//! Callers only ever receive snapshots; the timeline and the UTXO set are never handed out by
//! reference.

use crate::config::{ChainParams, SyncConfig};
use crate::indexer::{
	ExplorerTx, HistoryPage, IndexerError, LedgerBackend, LiteUtxo, PageQuery, WalletIdentity,
};
use crate::wallet::address_index::address_index;
use crate::wallet::sync::{
	classifier::TxClassifier,
	events::{EventDispatcher, SyncEvent, SyncEventHandler},
	progress_tracker::{SyncProgressTracker, SyncStats},
	timeline::Timeline,
	window::{self, HistoryWindow},
};
use crate::wallet::{
	AddressPathIndex, EnrichmentContext, HistoricalTx, MasterKey, Utxo, WalletSyncError,
};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Timeline plus the bookkeeping that is reset with it.
#[derive(Default)]
struct HistoryState {
	timeline: Timeline,
	progress: SyncProgressTracker,
}

impl HistoryState {
	/// Upper bound for the next historical page.
	///
	/// Lower of the oldest timeline entry and the oldest height scanned so far, so pages whose
	/// transactions all classify away still move the window down.
	fn boundary_height(&self) -> u64 {
		let timeline = self.timeline.boundary_height();
		match self.progress.scanned_floor() {
			Some(floor) if timeline == 0 || floor < timeline => floor,
			_ => timeline,
		}
	}
}

/// Keeps wallet state in step with a ledger backend.
pub struct SyncCoordinator {
	backend: Arc<dyn LedgerBackend>,
	chain: ChainParams,
	config: SyncConfig,
	classifier: TxClassifier,

	enabled: AtomicBool,
	cached_height: AtomicU64,
	last_wallet: AtomicU32,
	/// Bumped on every wallet switch so in-flight fetches can detect they are stale.
	wallet_generation: AtomicU64,

	master_key: RwLock<Option<Arc<dyn MasterKey>>>,
	history: Mutex<HistoryState>,
	utxos: Mutex<Vec<LiteUtxo>>,
	dispatcher: Mutex<EventDispatcher>,

	// Single-slot guards
	utxo_guard: Mutex<()>,
	history_guard: Mutex<()>,
}

impl SyncCoordinator {
	pub fn new(backend: Arc<dyn LedgerBackend>, chain: ChainParams, config: SyncConfig) -> Self {
		info!(
			"Using {} backend for {:?}",
			backend.name(),
			chain.network
		);
		Self {
			backend,
			classifier: TxClassifier::new(chain.clone()),
			chain,
			config,
			enabled: AtomicBool::new(true),
			cached_height: AtomicU64::new(0),
			last_wallet: AtomicU32::new(0),
			wallet_generation: AtomicU64::new(0),
			master_key: RwLock::new(None),
			history: Mutex::new(HistoryState::default()),
			utxos: Mutex::new(Vec::new()),
			dispatcher: Mutex::new(EventDispatcher::new()),
			utxo_guard: Mutex::new(()),
			history_guard: Mutex::new(()),
		}
	}

	/// Register an observer for sync events.
	pub async fn register_handler(&self, handler: Box<dyn SyncEventHandler>) {
		self.dispatcher.lock().await.register_handler(handler);
	}

	/// Load the wallet key.
	///
	/// A key with a different export fingerprint is a different wallet: the timeline, the
	/// completion flag, the UTXO set and the address-index high-water mark are cleared.
	pub async fn set_master_key(&self, key: Arc<dyn MasterKey>) -> Result<(), WalletSyncError> {
		let fingerprint = key.key_to_export().await?;
		let mut current = self.master_key.write().await;

		let changed = match current.as_ref() {
			Some(previous) => previous.key_to_export().await? != fingerprint,
			None => true,
		};

		if changed {
			// Bumped before clearing; writers compare it while holding the lock they write under.
			self.wallet_generation.fetch_add(1, Ordering::SeqCst);

			let mut history = self.history.lock().await;
			if !history.timeline.is_empty() {
				info!("Wallet changed, clearing {} history entries", history.timeline.len());
			}
			history.timeline.clear();
			history.progress = SyncProgressTracker::new();
			drop(history);

			self.utxos.lock().await.clear();
			self.last_wallet.store(0, Ordering::SeqCst);
		}

		*current = Some(key);
		Ok(())
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled.load(Ordering::SeqCst)
	}

	/// Re-enable the backend. Emits `BackendEnabled` only on an actual change.
	pub async fn enable(&self) {
		if !self.enabled.swap(true, Ordering::SeqCst) {
			info!("Explorer backend re-enabled");
			self.emit(SyncEvent::BackendEnabled).await;
		}
	}

	/// Disable the backend. Emits `BackendDisabled` only on an actual change.
	pub async fn disable(&self, reason: &str) {
		if self.enabled.swap(false, Ordering::SeqCst) {
			warn!("Explorer backend disabled: {}", reason);
			self.emit(SyncEvent::BackendDisabled {
				reason: reason.to_string(),
			})
			.await;
		}
	}

	pub async fn toggle(&self) {
		if self.is_enabled() {
			self.disable("disabled by user").await;
		} else {
			self.enable().await;
		}
	}

	/// Last chain tip observed by `poll`.
	pub fn cached_height(&self) -> u64 {
		self.cached_height.load(Ordering::SeqCst)
	}

	/// Highest receiving-address index seen while enriching UTXOs.
	pub fn last_wallet(&self) -> u32 {
		self.last_wallet.load(Ordering::SeqCst)
	}

	/// Check the chain tip and refresh wallet state when it moved.
	///
	/// Returns `Ok(true)` when a new block was seen. Any failure disables the backend and is
	/// returned to the caller.
	pub async fn poll(&self) -> Result<bool, WalletSyncError> {
		if !self.is_enabled() {
			debug!("Explorer backend disabled, skipping poll");
			return Ok(false);
		}

		self.emit(SyncEvent::SyncStarted).await;
		let result = self.poll_tip().await;
		if let Err(e) = &result {
			error!("Poll failed: {}", e);
			self.disable(&e.to_string()).await;
		}
		self.emit(SyncEvent::SyncStopped).await;
		result
	}

	async fn poll_tip(&self) -> Result<bool, WalletSyncError> {
		// Held for the whole poll so wallet refreshes requested meanwhile short-circuit.
		let _guard = self.utxo_guard.lock().await;

		let height = self.backend.get_block_height().await?;
		let previous = self.cached_height.fetch_max(height, Ordering::SeqCst);
		if height <= previous {
			debug!("Chain tip unchanged at {}", previous);
			return Ok(false);
		}

		info!("New block detected: {} -> {}", previous, height);
		self.emit(SyncEvent::NewBlock { height }).await;

		if self.current_key().await.is_some() {
			self.refresh_wallet_utxos().await?;
		} else {
			debug!("No wallet key loaded, skipping UTXO refresh");
		}
		self.sync_history_chunk(true).await;
		Ok(true)
	}

	/// Fetch lite UTXOs.
	///
	/// With an explicit address this is a side query: the result is returned and nothing else
	/// changes. Without one the wallet's set is refreshed and replaced; a refresh already in
	/// flight makes this return the current snapshot instead, and `NoMasterKey` is returned
	/// when no wallet is loaded.
	pub async fn refresh_utxos(
		&self,
		address: Option<&str>,
	) -> Result<Vec<LiteUtxo>, WalletSyncError> {
		if !self.is_enabled() {
			return match address {
				Some(_) => Err(WalletSyncError::BackendDisabled),
				None => Ok(self.utxos().await),
			};
		}

		if let Some(address) = address {
			return match self.backend.get_utxos(address).await {
				Ok(utxos) => Ok(utxos),
				Err(e) => Err(self.backend_failure(e).await),
			};
		}

		if self.current_key().await.is_none() {
			return Err(WalletSyncError::NoMasterKey);
		}
		let Ok(_guard) = self.utxo_guard.try_lock() else {
			debug!("UTXO refresh already in progress");
			return Ok(self.utxos().await);
		};

		match self.refresh_wallet_utxos().await {
			Ok(utxos) => Ok(utxos),
			Err(e) => {
				error!("UTXO refresh failed: {}", e);
				self.disable(&e.to_string()).await;
				Err(e)
			}
		}
	}

	/// Replace the wallet's UTXO set. Callers hold `utxo_guard`.
	///
	/// A result fetched for a wallet that was switched out meanwhile is dropped, and the
	/// current snapshot is returned instead.
	async fn refresh_wallet_utxos(&self) -> Result<Vec<LiteUtxo>, WalletSyncError> {
		let (key, generation) = self
			.current_key_with_generation()
			.await
			.ok_or(WalletSyncError::NoMasterKey)?;
		let identity = self.wallet_identity(key.as_ref()).await?;
		let utxos = self.backend.get_utxos(identity.as_str()).await?;
		debug!("Fetched {} UTXOs", utxos.len());

		{
			let mut current = self.utxos.lock().await;
			if self.wallet_generation.load(Ordering::SeqCst) != generation {
				warn!("Wallet changed during UTXO refresh, discarding {} UTXOs", utxos.len());
				return Ok(current.clone());
			}
			*current = utxos.clone();
		}
		self.emit(SyncEvent::UtxoSetUpdated {
			utxos: utxos.clone(),
		})
		.await;
		Ok(utxos)
	}

	/// Snapshot of the wallet's lite UTXOs.
	pub async fn utxos(&self) -> Vec<LiteUtxo> {
		self.utxos.lock().await.clone()
	}

	/// Resolve one lite UTXO into a spendable output; `Ok(None)` for unsupported scripts.
	pub async fn get_utxo_full_info(&self, lite: &LiteUtxo) -> Result<Option<Utxo>, WalletSyncError> {
		if !self.is_enabled() {
			return Err(WalletSyncError::BackendDisabled);
		}

		let is_hardware = match self.current_key().await {
			Some(key) => key.is_hardware_wallet(),
			None => false,
		};
		let context = EnrichmentContext {
			cached_height: self.cached_height(),
			coin_type: self.chain.coin_type(is_hardware),
		};

		let utxo = match self.backend.get_utxo_full_info(lite, &context).await {
			Ok(utxo) => utxo,
			Err(e) => return Err(self.backend_failure(e).await),
		};

		if let Some(index) = lite.path.as_deref().and_then(address_index) {
			self.last_wallet.fetch_max(index, Ordering::SeqCst);
		}
		if utxo.is_none() {
			debug!("Ignoring unsupported output {}:{}", lite.txid, lite.vout);
		}
		Ok(utxo)
	}

	/// Resolve the whole UTXO snapshot, dropping unsupported outputs.
	pub async fn enrich_utxos(&self) -> Result<Vec<Utxo>, WalletSyncError> {
		let snapshot = self.utxos().await;
		let resolved = futures::future::try_join_all(
			snapshot.iter().map(|lite| self.get_utxo_full_info(lite)),
		)
		.await?;
		Ok(resolved.into_iter().flatten().collect())
	}

	/// Fetch and merge one chunk of history, returning the resulting timeline.
	///
	/// `new_only` skips the historical window. This never fails: a chunk already in flight, a
	/// disabled backend, a missing key or a failed fetch all return the current timeline.
	pub async fn sync_history_chunk(&self, new_only: bool) -> Vec<HistoricalTx> {
		let Ok(_guard) = self.history_guard.try_lock() else {
			debug!("History sync already in progress");
			return self.history().await;
		};

		if !self.is_enabled() {
			return self.history().await;
		}
		let Some((key, generation)) = self.current_key_with_generation().await else {
			debug!("No wallet key loaded, skipping history sync");
			return self.history().await;
		};

		if let Err(e) = self.fetch_and_merge(key.as_ref(), generation, new_only).await {
			error!("History sync failed: {}", e);
			if e.is_network() {
				self.disable(&e.to_string()).await;
			}
		}
		self.history().await
	}

	async fn fetch_and_merge(
		&self,
		key: &dyn MasterKey,
		generation: u64,
		new_only: bool,
	) -> Result<(), WalletSyncError> {
		let (boundary, history_synced) = {
			let history = self.history.lock().await;
			(history.boundary_height(), history.progress.is_history_synced())
		};

		let identity = self.wallet_identity(key).await?;
		let recent_query = window::recent_window(
			self.cached_height(),
			self.config.recent_window,
			self.config.page_size,
		);
		let historical_query = (!new_only && !history_synced)
			.then(|| window::historical_window(boundary, self.config.page_size));

		if recent_query.is_none() && historical_query.is_none() {
			return Ok(());
		}

		let (recent, historical) = futures::try_join!(
			self.fetch_page(&identity, recent_query),
			self.fetch_page(&identity, historical_query),
		)?;

		// Recent tokens are applied last so they win over historical ones.
		let index = AddressPathIndex::from_pages(&identity, historical.iter().chain(recent.iter()));
		let recent_entries = recent
			.as_ref()
			.map(|page| self.classifier.classify_batch(&page.transactions, &index))
			.unwrap_or_default();
		let historical_entries = historical
			.as_ref()
			.map(|page| self.classifier.classify_batch(&page.transactions, &index))
			.unwrap_or_default();

		let mut history = self.history.lock().await;
		if self.wallet_generation.load(Ordering::SeqCst) != generation {
			warn!("Wallet changed during history sync, discarding fetched pages");
			return Ok(());
		}

		if let Some(page) = &recent {
			history
				.progress
				.record_page(HistoryWindow::Recent, page.transactions.len());
		}
		if let Some(page) = &historical {
			history
				.progress
				.record_page(HistoryWindow::Historical, page.transactions.len());
			let oldest = page
				.transactions
				.iter()
				.filter_map(ExplorerTx::confirmed_height)
				.min();
			if let Some(oldest) = oldest {
				history.progress.record_scanned_height(oldest);
			}
		}

		let outcome = history.timeline.merge_chunk(recent_entries, historical_entries);
		let boundary = history.timeline.boundary_height();
		history
			.progress
			.record_merge(outcome.prepended, outcome.appended, boundary);

		if let (Some(page), Some(query)) = (&historical, historical_query) {
			if window::is_last_page(page.transactions.len(), page.items_on_page, query.page_size) {
				history.progress.mark_history_synced();
			}
		}
		history.progress.log_progress(false);
		Ok(())
	}

	async fn fetch_page(
		&self,
		identity: &WalletIdentity,
		query: Option<PageQuery>,
	) -> Result<Option<HistoryPage>, WalletSyncError> {
		match query {
			Some(query) => Ok(Some(self.backend.get_history_page(identity, &query).await?)),
			None => Ok(None),
		}
	}

	/// Snapshot of the timeline, newest first.
	pub async fn history(&self) -> Vec<HistoricalTx> {
		self.history.lock().await.timeline.to_vec()
	}

	pub async fn is_history_synced(&self) -> bool {
		self.history.lock().await.progress.is_history_synced()
	}

	pub async fn progress_stats(&self) -> SyncStats {
		self.history.lock().await.progress.get_stats()
	}

	/// Submit a signed transaction.
	///
	/// The hex is validated locally first. A rejection is reported through a
	/// `BroadcastResult` event and an error, but leaves the backend enabled.
	pub async fn broadcast(&self, raw_tx_hex: &str) -> Result<String, WalletSyncError> {
		let raw_tx_hex = raw_tx_hex.trim();
		hex::decode(raw_tx_hex)?;

		if !self.is_enabled() {
			return Err(WalletSyncError::BackendDisabled);
		}

		match self.backend.broadcast(raw_tx_hex).await {
			Ok(txid) => {
				info!("Transaction broadcast: {}", txid);
				self.emit(SyncEvent::BroadcastResult {
					success: true,
					detail: txid.clone(),
				})
				.await;
				Ok(txid)
			}
			Err(IndexerError::BroadcastRejected(reason)) => {
				warn!("Transaction rejected: {}", reason);
				self.emit(SyncEvent::BroadcastResult {
					success: false,
					detail: reason.clone(),
				})
				.await;
				Err(WalletSyncError::Broadcast(reason))
			}
			Err(e) => Err(self.backend_failure(e).await),
		}
	}

	/// Explorer-format detail of any transaction.
	pub async fn tx_detail(&self, txid: &str) -> Result<ExplorerTx, WalletSyncError> {
		if !self.is_enabled() {
			return Err(WalletSyncError::BackendDisabled);
		}
		match self.backend.get_tx_detail(txid).await {
			Ok(tx) => Ok(tx),
			Err(e) => Err(self.backend_failure(e).await),
		}
	}

	async fn backend_failure(&self, e: IndexerError) -> WalletSyncError {
		error!("{} request failed: {}", self.backend.name(), e);
		if e.is_network() {
			self.disable(&e.to_string()).await;
		}
		e.into()
	}

	async fn current_key(&self) -> Option<Arc<dyn MasterKey>> {
		self.master_key.read().await.clone()
	}

	/// The key together with the wallet generation it belongs to.
	///
	/// Both are read under the key lock, which `set_master_key` holds while bumping the
	/// generation.
	async fn current_key_with_generation(&self) -> Option<(Arc<dyn MasterKey>, u64)> {
		let key = self.master_key.read().await;
		key.clone()
			.map(|key| (key, self.wallet_generation.load(Ordering::SeqCst)))
	}

	async fn wallet_identity(&self, key: &dyn MasterKey) -> Result<WalletIdentity, WalletSyncError> {
		if key.is_hd() {
			let path = self.chain.account_path(key.is_hardware_wallet());
			Ok(WalletIdentity::Xpub(key.get_xpub(&path).await?))
		} else {
			Ok(WalletIdentity::Address(key.get_address().await?))
		}
	}

	async fn emit(&self, event: SyncEvent) {
		self.dispatcher.lock().await.dispatch(&event).await;
	}
}
