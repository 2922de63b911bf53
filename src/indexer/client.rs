//!
//! HTTP client for a Blockbook explorer.
//!
//! This module provides the `LedgerBackend` adapter that talks to Blockbook's `api/v2` REST
//! endpoints. Idempotent GET requests are retried with exponential backoff while the failure
//! looks transient; broadcasts are sent exactly once.

use super::backend::LedgerBackend;
use super::types::*;
use crate::config::ExplorerConfig;
use async_trait::async_trait;
use backoff::{ExponentialBackoff, future::retry};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Blockbook explorer client
#[derive(Clone)]
pub struct BlockbookClient {
	/// The underlying HTTP client.
	http_client: Client,
	/// Base URL of the explorer, without trailing slash.
	explorer_url: String,
	/// Give up retrying a GET after this long.
	retry_max_elapsed: Duration,
}

impl BlockbookClient {
	/// Create a new explorer client.
	///
	/// # Arguments
	/// * `config` - Explorer URL and transport settings.
	///
	/// # Returns
	/// A new `BlockbookClient`, or an `IndexerError` if the HTTP client cannot be built.
	pub fn new(config: &ExplorerConfig) -> Result<Self, IndexerError> {
		let http_client = Client::builder().timeout(config.request_timeout).build()?;

		Ok(Self {
			http_client,
			explorer_url: config.explorer_url.trim_end_matches('/').to_string(),
			retry_max_elapsed: config.retry_max_elapsed,
		})
	}

	pub fn explorer_url(&self) -> &str {
		&self.explorer_url
	}

	fn backoff(&self) -> ExponentialBackoff {
		ExponentialBackoff {
			max_elapsed_time: Some(self.retry_max_elapsed),
			..ExponentialBackoff::default()
		}
	}

	/// Execute a GET request and decode the JSON body.
	///
	/// Transport errors and 5xx responses are retried; other failures are returned at once.
	async fn get_json<T: DeserializeOwned + Send>(
		&self,
		path: &str,
		query: &[(&str, String)],
	) -> Result<T, IndexerError> {
		let url = format!("{}{}", self.explorer_url, path);
		let url = url.as_str();

		retry(self.backoff(), || async move {
			let response = self
				.http_client
				.get(url)
				.query(query)
				.send()
				.await
				.map_err(|e| {
					debug!("GET {} failed: {}", url, e);
					backoff::Error::transient(IndexerError::HttpError(e))
				})?;

			let status = response.status();
			if status.is_server_error() {
				debug!("GET {} returned {}", url, status);
				return Err(backoff::Error::transient(IndexerError::ExplorerError(
					format!("HTTP error: {}", status),
				)));
			}
			if !status.is_success() {
				return Err(backoff::Error::permanent(IndexerError::ExplorerError(
					format!("HTTP error: {}", status),
				)));
			}

			let body = response
				.bytes()
				.await
				.map_err(|e| backoff::Error::transient(IndexerError::HttpError(e)))?;
			serde_json::from_slice::<T>(&body)
				.map_err(|e| backoff::Error::permanent(IndexerError::JsonError(e)))
		})
		.await
	}
}

#[async_trait]
impl LedgerBackend for BlockbookClient {
	async fn get_block_height(&self) -> Result<u64, IndexerError> {
		let status: ExplorerStatus = self.get_json("/api/v2/api", &[]).await?;
		Ok(status.backend.blocks)
	}

	async fn get_utxos(&self, key: &str) -> Result<Vec<LiteUtxo>, IndexerError> {
		self.get_json(&format!("/api/v2/utxo/{}", key), &[]).await
	}

	async fn get_tx_specific(&self, txid: &str) -> Result<SpecificTx, IndexerError> {
		self.get_json(&format!("/api/v2/tx-specific/{}", txid), &[])
			.await
	}

	async fn get_history_page(
		&self,
		identity: &WalletIdentity,
		query: &PageQuery,
	) -> Result<HistoryPage, IndexerError> {
		let mut params = vec![
			("details", "txs".to_string()),
			("tokens", "derived".to_string()),
			("pageSize", query.page_size.to_string()),
		];
		if let Some(from) = query.from {
			params.push(("from", from.to_string()));
		}
		if let Some(to) = query.to {
			params.push(("to", to.to_string()));
		}

		debug!(
			"Fetching {} history page (from: {:?}, to: {:?})",
			identity.endpoint(),
			query.from,
			query.to
		);
		self.get_json(
			&format!("/api/v2/{}/{}", identity.endpoint(), identity.as_str()),
			&params,
		)
		.await
	}

	async fn broadcast(&self, raw_tx_hex: &str) -> Result<String, IndexerError> {
		let response = self
			.http_client
			.post(format!("{}/api/v2/sendtx/", self.explorer_url))
			.body(raw_tx_hex.to_string())
			.send()
			.await?;

		let status = response.status();
		let text = response.text().await?;

		match serde_json::from_str::<SendTxResponse>(&text) {
			Ok(reply) => match reply.txid() {
				Some(txid) => {
					info!("Transaction sent: {}", txid);
					Ok(txid.to_string())
				}
				None => {
					let reason = reply.reason();
					warn!("Error sending transaction: {}", reason);
					Err(IndexerError::BroadcastRejected(reason))
				}
			},
			Err(e) if status.is_success() => Err(IndexerError::JsonError(e)),
			Err(_) => Err(IndexerError::ExplorerError(format!(
				"HTTP error: {}: {}",
				status, text
			))),
		}
	}

	async fn get_tx_detail(&self, txid: &str) -> Result<ExplorerTx, IndexerError> {
		self.get_json(&format!("/api/v2/tx/{}", txid), &[]).await
	}

	fn name(&self) -> &'static str {
		"BlockbookClient"
	}
}
