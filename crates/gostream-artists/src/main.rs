//! Entry point for the `gostream-artists` service.
//!
//! Loads configuration from the environment, connects to `MongoDB`, and
//! serves the artists API until `Ctrl-C`.

use std::sync::Arc;

use gostream_artists::{AppState, ServiceConfig, start_server};
use gostream_store::Connection;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, `MongoDB` cannot be
/// reached, or the server fails to bind.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("gostream-artists starting");

    let config = ServiceConfig::from_env()?;
    info!(
        mongo_host = config.mongo_host,
        database = config.database,
        collection = config.collection,
        port = config.port,
        "configuration loaded"
    );

    let connection = Connection::connect(&config.mongo()).await?;

    let state = AppState::new(&connection, &config.database, &config.collection)
        .with_request_timeout(config.request_timeout);

    start_server(&config.server(), Arc::new(state)).await?;

    Ok(())
}
