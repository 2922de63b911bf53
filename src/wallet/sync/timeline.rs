//! Newest-first list of classified transactions.

use crate::wallet::HistoricalTx;
use std::collections::{HashSet, VecDeque};

/// Ordered history with id-based deduplication.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
	entries: VecDeque<HistoricalTx>,
	ids: HashSet<String>,
}

/// Number of entries a merge added at each end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
	pub prepended: usize,
	pub appended: usize,
}

impl Timeline {
	pub fn new() -> Self {
		Self::default()
	}

	/// Height of the oldest entry, or 0 when there is none.
	pub fn boundary_height(&self) -> u64 {
		self.entries
			.back()
			.and_then(|tx| tx.block_height)
			.unwrap_or(0)
	}

	/// Merge one chunk.
	///
	/// `recent` must be newest-first; entries already present or also contained in
	/// `historical` are skipped, the rest are prepended. `historical` entries not yet
	/// present are appended in order.
	pub fn merge_chunk(
		&mut self,
		recent: Vec<HistoricalTx>,
		historical: Vec<HistoricalTx>,
	) -> MergeOutcome {
		let mut outcome = MergeOutcome::default();
		let historical_ids: HashSet<String> = historical.iter().map(|tx| tx.id.clone()).collect();

		for tx in recent.into_iter().rev() {
			if self.ids.contains(&tx.id) || historical_ids.contains(&tx.id) {
				continue;
			}
			self.ids.insert(tx.id.clone());
			self.entries.push_front(tx);
			outcome.prepended += 1;
		}

		for tx in historical {
			if self.ids.insert(tx.id.clone()) {
				self.entries.push_back(tx);
				outcome.appended += 1;
			}
		}

		outcome
	}

	pub fn contains(&self, id: &str) -> bool {
		self.ids.contains(id)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn clear(&mut self) {
		self.entries.clear();
		self.ids.clear();
	}

	pub fn to_vec(&self) -> Vec<HistoricalTx> {
		self.entries.iter().cloned().collect()
	}
}
