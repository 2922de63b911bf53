//! Explorer integration module
//!
//! This module provides the ledger backend capability, its Blockbook HTTP adapter and the
//! wire types exchanged with the explorer. The explorer indexes the chain and answers
//! address and xpub queries for UTXOs, paginated transaction history and broadcasts.

/// The `LedgerBackend` capability trait
mod backend;
/// REST client for Blockbook explorers
mod client;
/// Type definitions for explorer data structures
mod types;

pub use backend::LedgerBackend;
pub use client::BlockbookClient;
pub use types::*;
