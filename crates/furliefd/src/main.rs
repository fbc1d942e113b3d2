//! Furlief Daemon - waitlist, quiz and analytics API for the Furlief site

use anyhow::{Context, Result};
use furlief_common::{Config, SqliteStore};
use furliefd::server::{self, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Furlief daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::load();
    let store = SqliteStore::open(&config.store.db_path)
        .with_context(|| format!("Failed to open store at {}", config.store.db_path.display()))?;

    let state = AppState::new(store, config)?;
    server::run(state).await
}
