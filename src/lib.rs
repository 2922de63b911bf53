pub mod config;
pub mod indexer;
pub mod utils;
pub mod wallet;
