use api_rest::startup::{config_from_env, init_tracing, rest_addr_from_env};
use api_rest::{AppState, router};
use std::sync::Arc;

/// Main entry point for the Cartella application
///
/// Loads `.env`, then serves the REST API on `CARTELLA_REST_ADDR` (default "0.0.0.0:3000").
///
/// # Environment Variables
/// - `CARTELLA_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PATIENT_DATA_DIR`: Directory for patient data storage (default: "patient_data")
/// - `CARTELLA_PAGE_SIZE`: Default page size for report listings (default: 10)
/// - `CARTELLA_MAX_PAGE_SIZE`: Largest page size a client may request (default: 100)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, binding or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing("cartella=info")?;

    let rest_addr = rest_addr_from_env();
    let cfg = Arc::new(config_from_env()?);

    tracing::info!("++ Starting Cartella REST on {}", rest_addr);
    tracing::info!(
        "++ Patient data directory: {}",
        cfg.patient_data_dir().display()
    );

    let rest_app = router(AppState::new(cfg));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, rest_app).await?;

    Ok(())
}
