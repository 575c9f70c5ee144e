//! Startup helpers shared by the server binaries.
//!
//! Everything here reads the process environment, so it must only run before the server starts
//! accepting requests.

use cartella_core::config::core_config_from_env;
use cartella_core::CoreConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default bind address of the REST server.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` directives are honoured; `default_directive` is added on top so the server's own
/// logs are visible out of the box.
pub fn init_tracing(default_directive: &str) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(default_directive.parse()?))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}

/// Resolve the bind address from `CARTELLA_REST_ADDR`.
pub fn rest_addr_from_env() -> String {
    std::env::var("CARTELLA_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into())
}

/// Build the core configuration from environment variables.
///
/// See [`cartella_core::config::core_config_from_env`] for the variables read.
///
/// # Errors
/// Returns an error if the patient data directory does not exist or a page size setting is
/// invalid.
pub fn config_from_env() -> anyhow::Result<CoreConfig> {
    Ok(core_config_from_env()?)
}
