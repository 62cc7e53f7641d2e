//! Heartbeat - website uptime monitor
//!
//! Probes a single endpoint once a minute and posts a Discord message when it
//! goes up or down. The id of the last message is persisted so a restart does
//! not repeat an announcement that is still visible in the channel.

pub mod clock;
pub mod config;
pub mod discord;
pub mod engine;
pub mod error;
pub mod io;
pub mod notifier;
pub mod probe;
pub mod status;
pub mod status_codes;
pub mod store;

pub use config::Config;
pub use error::{HeartbeatError, Result};

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::clock::SystemClock;
use crate::discord::DiscordNotifier;
use crate::engine::Engine;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::probe::HttpSiteProber;
use crate::status_codes::StatusDescriptions;
use crate::store::SqliteStateStore;

/// Upper bound for any single probe, send, or fetch
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Run the heartbeat service with the given configuration
pub async fn run(config: Config) -> Result<()> {
    let descriptions = Arc::new(StatusDescriptions::load_or_empty(
        &config.status_descriptions_path,
    ));
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::with_timeout(REQUEST_TIMEOUT)?);

    let prober = Arc::new(HttpSiteProber::new(Arc::clone(&http), descriptions));
    let notifier = Arc::new(DiscordNotifier::new(&config.webhook_url, Arc::clone(&http))?);
    let store = Arc::new(SqliteStateStore::open(&config.store).await?);
    tracing::info!("Connected to state store");

    let mut engine = Engine::new(&config, prober, notifier, store, Arc::new(SystemClock));

    let cancel = CancellationToken::new();
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
                return;
            }
        }
        cancel_for_signal.cancel();
    });

    engine.seed().await;

    tracing::info!("Starting website monitoring of {}", config.website_url);
    engine.run(cancel).await;
    tracing::info!("Website monitoring stopped");

    Ok(())
}
