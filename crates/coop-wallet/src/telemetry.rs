//! `tracing` subscriber setup for binaries embedding the wallet ledger.

use coop_types::{CoopError, ErrorCode, LogConfig, Result};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` overrides the configured
/// filter.
///
/// # Errors
/// `INT_CONFIG` if the filter does not parse or a subscriber is already
/// installed.
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter).map_err(|err| {
            CoopError::internal(
                ErrorCode::IntConfig,
                format!("invalid log filter {:?}: {err}", config.filter),
            )
        })?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| CoopError::internal(ErrorCode::IntConfig, err.to_string()))?;
    tracing::info!(
        version = coop_types::constants::VERSION,
        json = config.json,
        "Tracing initialised"
    );
    Ok(())
}
