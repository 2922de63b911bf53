//! Wallet Synchronization Module
//!
//! This module provides the logic for keeping a wallet in step with a block explorer.
//! It is composed of several submodules, each responsible for a specific aspect of the sync process:
//!
//! - `coordinator`: The entry point. Polls the chain tip, refreshes UTXOs, pages history and broadcasts.
//! - `classifier`: Turns raw explorer transactions into wallet-relative history entries.
//! - `timeline`: The deduplicated, newest-first history the coordinator owns.
//! - `window`: Height windows used to page history forward and backward.
//! - `events`: Typed events and the handler trait observers implement.
//! - `progress_tracker`: Tracks paging progress and whether history is complete.
//! - `runner`: One tick of the background loop, recovering from a disabled backend.

/// Transaction classification
pub mod classifier;
/// Main coordinator for the sync process
pub mod coordinator;
/// Event system for decoupled communication during sync
pub mod events;
/// Tracks synchronization progress and statistics
pub mod progress_tracker;
/// Background loop tick
pub mod runner;
/// Ordered, deduplicated history
pub mod timeline;
/// History paging windows
pub mod window;

pub use classifier::TxClassifier;
pub use coordinator::SyncCoordinator;
pub use events::{
	ChannelEventHandler, EventDispatcher, LoggingEventHandler, SyncEvent, SyncEventHandler,
};
pub use progress_tracker::{SyncProgressTracker, SyncStats};
pub use runner::run_tick;
pub use timeline::{MergeOutcome, Timeline};
