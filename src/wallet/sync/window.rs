//! Height windows used to page transaction history.
//!
//! Each history chunk issues up to two bounded requests: a *recent* window anchored at the
//! chain tip, which picks up new and recently confirmed activity, and a *historical* window
//! ending just below the oldest height already covered, whether or not that page produced
//! timeline entries.

use crate::indexer::PageQuery;

/// Which of the two windows a page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWindow {
	Recent,
	Historical,
}

/// Query covering the last `depth` blocks below `tip`.
///
/// Returns `None` before the first block height has been observed.
pub fn recent_window(tip: u64, depth: u64, page_size: u32) -> Option<PageQuery> {
	(tip > 0).then(|| PageQuery {
		from: Some(tip.saturating_sub(depth)),
		to: None,
		page_size,
	})
}

/// Query for the page just older than `boundary_height`.
///
/// A zero boundary means the timeline is empty, so the newest page is requested.
pub fn historical_window(boundary_height: u64, page_size: u32) -> PageQuery {
	PageQuery {
		from: None,
		to: (boundary_height > 0).then(|| boundary_height - 1),
		page_size,
	}
}

/// A historical page shorter than the page size means there is nothing older left.
pub fn is_last_page(received: usize, items_on_page: Option<u32>, requested: u32) -> bool {
	let expected = items_on_page.unwrap_or(requested) as usize;
	received < expected
}
