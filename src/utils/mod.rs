//!
//! Utility module for the explorer sync service.
//!
//! Re-exports formatting helpers used by logging and the runner.
/// Amount formatting helpers
pub mod amount;

pub use amount::{format_coin_amount, format_token_amount};
