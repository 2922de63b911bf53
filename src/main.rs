use blockbook_wallet_sync::config::ExplorerConfig;
use blockbook_wallet_sync::indexer::BlockbookClient;
use blockbook_wallet_sync::utils::format_coin_amount;
use blockbook_wallet_sync::wallet::sync::{LoggingEventHandler, run_tick};
use blockbook_wallet_sync::wallet::{SyncCoordinator, WatchOnlyKey};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Number of history entries printed once the history is complete.
const SHOW_LATEST: usize = 10;

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	info!("Starting explorer sync service");
	let config = ExplorerConfig::from_env();

	let Some(key) = watch_only_key_from_env() else {
		error!("Set WALLET_XPUB (optionally WALLET_HARDWARE=1) or WALLET_ADDRESS");
		std::process::exit(1);
	};

	let client = match BlockbookClient::new(&config) {
		Ok(client) => client,
		Err(e) => {
			error!("Failed to create explorer client: {}", e);
			std::process::exit(1);
		}
	};

	let coordinator = SyncCoordinator::new(Arc::new(client), config.chain.clone(), config.sync.clone());
	coordinator
		.register_handler(Box::new(LoggingEventHandler))
		.await;

	if let Err(e) = coordinator.set_master_key(Arc::new(key)).await {
		error!("Failed to load wallet key: {}", e);
		std::process::exit(1);
	}

	let mut interval = tokio::time::interval(config.sync.poll_interval);
	let mut reported_complete = false;

	loop {
		interval.tick().await;

		match run_tick(&coordinator).await {
			Ok(true) => match coordinator.enrich_utxos().await {
				Ok(utxos) => {
					let total: u64 = utxos.iter().map(|utxo| utxo.sats).sum();
					info!(
						"{} spendable outputs, balance {} (last address index {})",
						utxos.len(),
						format_coin_amount(total),
						coordinator.last_wallet()
					);
				}
				Err(e) => error!("Failed to resolve UTXOs: {}", e),
			},
			Ok(false) => {}
			Err(e) => warn!(
				"Explorer unavailable, next attempt in {:?}: {}",
				config.sync.poll_interval, e
			),
		}

		if !reported_complete && coordinator.is_history_synced().await {
			reported_complete = true;
			info!("{}", coordinator.progress_stats().await.summary());
			for entry in coordinator.history().await.iter().take(SHOW_LATEST) {
				info!("{}", entry);
			}
		}
	}
}

fn watch_only_key_from_env() -> Option<WatchOnlyKey> {
	if let Ok(xpub) = std::env::var("WALLET_XPUB") {
		let hardware = std::env::var("WALLET_HARDWARE")
			.map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
			.unwrap_or(false);
		return Some(WatchOnlyKey::Xpub { xpub, hardware });
	}
	std::env::var("WALLET_ADDRESS").ok().map(WatchOnlyKey::Address)
}
