//! # Structured Logging
//!
//! Span macros and subscriber setup using the tracing ecosystem.
//!
//! Logs go to stderr. `RUST_LOG`, when set, overrides the configured log
//! level. In JSON mode every event is emitted as one JSON object per line
//! with the current span fields attached.

use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{Error, Result};

/// Create a tracing span for one RPC call.
///
/// ```rust,ignore
/// let span = rpc_span!("GetTemplate", service = %service, file = %file);
/// ```
#[macro_export]
macro_rules! rpc_span {
    ($method:expr) => {
        tracing::info_span!(
            "rpc",
            method = %$method,
            request_id = %uuid::Uuid::new_v4()
        )
    };
    ($method:expr, $($field:tt)*) => {
        tracing::info_span!(
            "rpc",
            method = %$method,
            request_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Create a tracing span for one secret store call.
#[macro_export]
macro_rules! store_span {
    ($operation:expr, $environment:expr, $path:expr) => {
        tracing::debug_span!(
            "store_operation",
            operation = %$operation,
            environment = %$environment,
            path = %$path
        )
    };
}

fn env_filter(config: &ObservabilityConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            Error::config(format!("Invalid log level '{}': {}", config.log_level, e))
        }),
    }
}

/// Install the global subscriber.
///
/// Returns `Ok(false)` if a subscriber was already installed (for example by
/// a test harness); that is not treated as an error.
pub fn init_logging(config: &ObservabilityConfig) -> Result<bool> {
    let filter = env_filter(config)?;

    let installed = if config.json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_current_span(true)
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    };

    Ok(installed)
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        api_address = %config.api.socket_address(),
        store_backend = %config.store.backend,
        environments = ?config.tree.environments,
        default_environment = %config.tree.default_environment,
        listing_warnings = %config.tree.listing_warnings,
        fan_out = %config.tree.fan_out,
        request_timeout_seconds = config.tree.request_timeout_seconds,
        metrics_enabled = %config.observability.enable_metrics,
        "keytree configuration"
    );
}
