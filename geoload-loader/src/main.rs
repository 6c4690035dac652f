//! Geoload loader binary.
//!
//! Copies the county table from Postgres into a freshly created, expiring BigQuery table in
//! fixed-size batches, then exits.

use crate::config::load_loader_config;
use crate::core::start_loader_with_config;
use crate::error::{LoaderError, LoaderResult};

use geoload_config::shared::LoaderConfig;
use geoload_destinations::encryption::install_crypto_provider;
use geoload_telemetry::init_tracing;
use tracing::error;

mod config;
mod core;
mod error;

/// Entry point for the loader.
///
/// Loads configuration, initializes tracing, starts the async runtime and runs the load once.
/// The process exits non-zero when the load fails.
fn main() -> LoaderResult<()> {
    let loader_config = load_loader_config()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME")).map_err(LoaderError::config)?;

    // Both the Postgres TLS connector and the BigQuery client rely on a process-wide provider.
    install_crypto_provider();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(loader_config))?;

    Ok(())
}

async fn async_main(loader_config: LoaderConfig) -> LoaderResult<()> {
    if let Err(err) = start_loader_with_config(loader_config).await {
        error!(category = err.category(), "{err}");
        eprint!("{}", err.render_report());

        return Err(err);
    }

    Ok(())
}
