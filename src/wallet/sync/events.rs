//! Event system for wallet synchronization.
//!
//! This module defines the domain events published by the sync coordinator, the handler trait
//! observers implement, and the dispatcher that fans events out to every registered handler.
//! Callers subscribe by registering a handler instead of listening on a global emitter.

use crate::indexer::LiteUtxo;
use crate::utils::format_coin_amount;
use crate::wallet::WalletSyncError;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Events that occur during wallet synchronization
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
	/// A block-height poll started
	SyncStarted,
	/// A block-height poll finished, successfully or not
	SyncStopped,
	/// The explorer reported a higher chain tip
	NewBlock { height: u64 },
	/// The wallet's UTXO set was replaced
	UtxoSetUpdated { utxos: Vec<LiteUtxo> },
	/// The explorer backend was disabled after a failure
	BackendDisabled { reason: String },
	/// The explorer backend was re-enabled
	BackendEnabled,
	/// Outcome of a broadcast: the txid on success, the rejection reason otherwise
	BroadcastResult { success: bool, detail: String },
}

/// Trait for handling sync events.
///
/// Implementors receive all sync events and can perform side effects or state updates.
#[async_trait::async_trait]
pub trait SyncEventHandler: Send + Sync {
	/// Handle a sync event.
	async fn handle(&mut self, event: &SyncEvent) -> Result<(), WalletSyncError>;

	/// Get the name of this handler for logging and diagnostics.
	fn name(&self) -> &'static str;
}

/// Event dispatcher that manages multiple event handlers.
///
/// Handlers are called in registration order, and a failing handler never prevents the
/// others from seeing the event.
#[derive(Default)]
pub struct EventDispatcher {
	handlers: Vec<Box<dyn SyncEventHandler>>,
}

impl EventDispatcher {
	/// Create a new, empty event dispatcher.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a new event handler.
	pub fn register_handler(&mut self, handler: Box<dyn SyncEventHandler>) {
		self.handlers.push(handler);
	}

	pub fn handler_count(&self) -> usize {
		self.handlers.len()
	}

	/// Dispatch an event to all registered handlers.
	pub async fn dispatch(&mut self, event: &SyncEvent) {
		for handler in &mut self.handlers {
			if let Err(e) = handler.handle(event).await {
				tracing::error!("Handler {} failed to process event: {}", handler.name(), e);
			}
		}
	}
}

/// Writes every event to the log.
pub struct LoggingEventHandler;

#[async_trait::async_trait]
impl SyncEventHandler for LoggingEventHandler {
	async fn handle(&mut self, event: &SyncEvent) -> Result<(), WalletSyncError> {
		match event {
			SyncEvent::SyncStarted | SyncEvent::SyncStopped => {}
			SyncEvent::NewBlock { height } => info!("Chain tip at height {}", height),
			SyncEvent::UtxoSetUpdated { utxos } => {
				let total: u64 = utxos.iter().map(|utxo| utxo.value).sum();
				info!(
					"UTXO set updated: {} outputs, {} coins",
					utxos.len(),
					format_coin_amount(total)
				);
			}
			SyncEvent::BackendDisabled { reason } => {
				warn!(
					"Failed to synchronize ({}). Re-enable the explorer to try again.",
					reason
				)
			}
			SyncEvent::BackendEnabled => info!("Explorer backend enabled"),
			SyncEvent::BroadcastResult { success: true, detail } => {
				info!("Broadcast accepted: {}", detail)
			}
			SyncEvent::BroadcastResult { success: false, detail } => {
				warn!("Broadcast rejected: {}", detail)
			}
		}
		Ok(())
	}

	fn name(&self) -> &'static str {
		"LoggingEventHandler"
	}
}

/// Forwards events into a channel so a task can consume them.
pub struct ChannelEventHandler {
	sender: mpsc::UnboundedSender<SyncEvent>,
}

impl ChannelEventHandler {
	/// Create a handler and the receiving end of its channel.
	pub fn new() -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
		let (sender, receiver) = mpsc::unbounded_channel();
		(Self { sender }, receiver)
	}
}

#[async_trait::async_trait]
impl SyncEventHandler for ChannelEventHandler {
	async fn handle(&mut self, event: &SyncEvent) -> Result<(), WalletSyncError> {
		// A dropped receiver just means nobody is listening anymore.
		let _ = self.sender.send(event.clone());
		Ok(())
	}

	fn name(&self) -> &'static str {
		"ChannelEventHandler"
	}
}
