//! Progress tracking for history synchronization.
//!
//! This module provides the `SyncProgressTracker`, which records how many history pages have
//! been fetched, how many classified entries were merged into the timeline, how far back the
//! timeline reaches, and whether the historical window has been paged to the end.
//!
//! The tracker is owned by the coordinator alongside the timeline and is reset together with
//! it when a different wallet is loaded.

use super::window::HistoryWindow;
use tracing::{debug, info};

/// Log a progress line every this many merges.
const LOG_EVERY_MERGES: usize = 5;

/// Service for tracking synchronization progress
#[derive(Debug, Clone, Default)]
pub struct SyncProgressTracker {
	/// Pages fetched from the recent window
	recent_pages: usize,
	/// Pages fetched from the historical window
	historical_pages: usize,
	/// Raw transactions received across all pages
	transactions_fetched: usize,
	/// Entries prepended from the recent window
	recent_merged: usize,
	/// Entries appended from the historical window
	historical_merged: usize,
	/// Height of the oldest timeline entry
	lowest_synced_height: Option<u64>,
	/// Lowest confirmed height seen on any historical page, classified or not
	scanned_floor: Option<u64>,
	/// Set once a historical page came back short
	history_synced: bool,
	merges_since_log: usize,
}

impl SyncProgressTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record a page received from the explorer
	pub fn record_page(&mut self, window: HistoryWindow, transactions: usize) {
		match window {
			HistoryWindow::Recent => self.recent_pages += 1,
			HistoryWindow::Historical => self.historical_pages += 1,
		}
		self.transactions_fetched += transactions;
		debug!("Received {:?} page with {} transactions", window, transactions);
	}

	/// Record the result of merging a chunk into the timeline
	pub fn record_merge(&mut self, prepended: usize, appended: usize, boundary_height: u64) {
		self.recent_merged += prepended;
		self.historical_merged += appended;
		if boundary_height > 0 {
			self.lowest_synced_height = Some(boundary_height);
		}
		self.merges_since_log += 1;
	}

	/// Record the oldest confirmed height on a historical page
	pub fn record_scanned_height(&mut self, height: u64) {
		if height == 0 {
			return;
		}
		self.scanned_floor = Some(self.scanned_floor.map_or(height, |floor| floor.min(height)));
	}

	/// Lowest height the historical window has reached
	pub fn scanned_floor(&self) -> Option<u64> {
		self.scanned_floor
	}

	/// The historical window has been paged to the first transaction
	pub fn mark_history_synced(&mut self) {
		if !self.history_synced {
			info!(
				"Transaction history fully synced down to height {}",
				self.lowest_synced_height.unwrap_or(0)
			);
		}
		self.history_synced = true;
	}

	pub fn is_history_synced(&self) -> bool {
		self.history_synced
	}

	/// Log progress at regular intervals or when forced
	pub fn log_progress(&mut self, force: bool) {
		if force || self.merges_since_log >= LOG_EVERY_MERGES {
			info!("History sync progress: {}", self.get_stats().summary());
			self.merges_since_log = 0;
		}
	}

	/// Get sync statistics as a SyncStats struct
	pub fn get_stats(&self) -> SyncStats {
		SyncStats {
			pages_fetched: self.recent_pages + self.historical_pages,
			historical_pages: self.historical_pages,
			transactions_fetched: self.transactions_fetched,
			entries_merged: self.recent_merged + self.historical_merged,
			lowest_synced_height: self.lowest_synced_height,
			history_synced: self.history_synced,
		}
	}
}

/// Statistics about the history sync progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStats {
	pub pages_fetched: usize,
	pub historical_pages: usize,
	pub transactions_fetched: usize,
	pub entries_merged: usize,
	pub lowest_synced_height: Option<u64>,
	pub history_synced: bool,
}

impl SyncStats {
	/// Get a human-readable summary of the sync statistics
	pub fn summary(&self) -> String {
		format!(
			"{} pages ({} historical), {} transactions fetched, {} entries merged, reaching height {}{}",
			self.pages_fetched,
			self.historical_pages,
			self.transactions_fetched,
			self.entries_merged,
			self.lowest_synced_height
				.map(|h| h.to_string())
				.unwrap_or_else(|| "-".to_string()),
			if self.history_synced { " (complete)" } else { "" }
		)
	}
}
