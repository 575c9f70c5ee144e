//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own, without loading a `.env` file.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `cartella-run` binary serves the
//! same router and additionally reads `.env`.

use api_rest::startup::{config_from_env, init_tracing, rest_addr_from_env};
use api_rest::{router, AppState};
use std::sync::Arc;

/// Main entry point for the Cartella REST API server
///
/// # Environment Variables
/// - `CARTELLA_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `PATIENT_DATA_DIR`, `CARTELLA_PAGE_SIZE`, `CARTELLA_MAX_PAGE_SIZE`: see
///   [`api_rest::startup::config_from_env`]
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("api_rest=info")?;

    let addr = rest_addr_from_env();
    let cfg = Arc::new(config_from_env()?);

    tracing::info!("-- Starting Cartella REST API on {}", addr);
    tracing::info!("-- Patient data directory: {}", cfg.patient_data_dir().display());

    let app = router(AppState::new(cfg));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
