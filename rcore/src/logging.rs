//! Logging setup.
//!
//! The engine logs through `tracing`; embedders call [`init_logging`] once to get a fmt
//! subscriber filtered by `RCORE_LOG` (standard `EnvFilter` syntax, default `warn`).

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "RCORE_LOG";

/// Installs the global subscriber. Returns false if one was already installed.
pub fn init_logging(default_filter: Option<&str>) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or("warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
