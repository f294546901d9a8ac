//! # Configuration Settings
//!
//! Defines the configuration structure for the keytree service. Every section
//! has a `from_env` constructor and a `Default` that matches the documented
//! environment variable defaults.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::errors::{Error, Result};
use crate::store::VaultConfig;
use crate::tree::{FanOut, ListingWarnings, DEFAULT_ENVIRONMENTS};

/// Main application configuration
#[derive(Debug, Clone, Default, Validate)]
pub struct AppConfig {
    /// HTTP API configuration
    #[validate(nested)]
    pub api: ApiServerConfig,

    /// Secret store backend selection
    pub store: StoreConfig,

    /// Vault connection settings (used by the `vault` backend)
    pub vault: VaultConfig,

    /// Tree traversal and request handling
    #[validate(nested)]
    pub tree: TreeConfig,

    /// Logging and metrics
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load every section from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api: ApiServerConfig::from_env(),
            store: StoreConfig::from_env()?,
            vault: VaultConfig::from_env(),
            tree: TreeConfig::from_env()?,
            observability: ObservabilityConfig::from_env(),
        })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()
    }

    /// Cross-section checks the derive cannot express
    fn validate_custom(&self) -> Result<()> {
        if self.observability.enable_metrics && self.observability.metrics_port == self.api.port {
            return Err(Error::config("API and metrics ports cannot be the same"));
        }

        if self.store.backend == StoreBackend::Vault && self.vault.address.trim().is_empty() {
            return Err(Error::config("VAULT_ADDR is required for the vault backend"));
        }

        Ok(())
    }
}

/// HTTP API server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApiServerConfig {
    /// Bind address
    #[validate(length(min = 1, message = "Bind address cannot be empty"))]
    pub bind_address: String,

    /// Port
    #[validate(range(min = 1, message = "API port must be between 1 and 65535"))]
    pub port: u16,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0".to_string(), port: 8008 }
    }
}

impl ApiServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_address =
            std::env::var("KEYTREE_API_BIND_ADDRESS").unwrap_or(defaults.bind_address);

        let port = std::env::var("KEYTREE_API_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        Self { bind_address, port }
    }

    /// `host:port` the listener binds to
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Which secret store implementation backs the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Vault,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vault" => Ok(Self::Vault),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vault => write!(f, "vault"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Secret store backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// YAML seed loaded into the `memory` backend
    pub seed_file: Option<PathBuf>,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        let backend = parse_env("KEYTREE_STORE_BACKEND")?.unwrap_or_default();
        let seed_file = std::env::var("KEYTREE_SEED_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self { backend, seed_file })
    }
}

/// Tree traversal and request handling
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TreeConfig {
    /// Ordered environments materialized by a full tree request
    #[validate(custom(function = "validate_environments"))]
    pub environments: Vec<String>,

    /// Environment bound for template requests
    #[validate(custom(function = "validate_environment_name"))]
    pub default_environment: String,

    /// Warning policy for listings other than template listings
    pub listing_warnings: ListingWarnings,

    /// Sequential or concurrent tree fetching
    pub fan_out: FanOut,

    /// Per-request deadline in seconds
    #[validate(range(
        min = 1,
        max = 3600,
        message = "Request timeout must be between 1 and 3600 seconds"
    ))]
    pub request_timeout_seconds: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            environments: DEFAULT_ENVIRONMENTS.iter().map(|s| s.to_string()).collect(),
            default_environment: "dev".to_string(),
            listing_warnings: ListingWarnings::default(),
            fan_out: FanOut::default(),
            request_timeout_seconds: 60,
        }
    }
}

impl TreeConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let environments = std::env::var("KEYTREE_ENVIRONMENTS")
            .ok()
            .map(|s| s.split(',').map(|e| e.trim().to_string()).collect())
            .unwrap_or(defaults.environments);

        let default_environment =
            std::env::var("KEYTREE_DEFAULT_ENV").unwrap_or(defaults.default_environment);

        let listing_warnings =
            parse_env("KEYTREE_LISTING_WARNINGS")?.unwrap_or(defaults.listing_warnings);

        let fan_out = parse_env("KEYTREE_TREE_FAN_OUT")?.unwrap_or(defaults.fan_out);

        let request_timeout_seconds = std::env::var("KEYTREE_REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.request_timeout_seconds);

        Ok(Self {
            environments,
            default_environment,
            listing_warnings,
            fan_out,
            request_timeout_seconds,
        })
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Logging and metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus exporter
    pub enable_metrics: bool,

    /// Metrics exporter port (0 = disabled)
    pub metrics_port: u16,

    /// Service name attached to metrics
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enable_metrics: false,
            metrics_port: 9090,
            service_name: "keytree".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let enable_metrics = std::env::var("KEYTREE_ENABLE_METRICS")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.enable_metrics);

        let metrics_port = std::env::var("KEYTREE_METRICS_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(defaults.metrics_port);

        let log_level = std::env::var("KEYTREE_LOG_LEVEL").unwrap_or(defaults.log_level);

        let json_logging = std::env::var("KEYTREE_JSON_LOGGING")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.json_logging);

        Self {
            enable_metrics,
            metrics_port,
            service_name: defaults.service_name,
            log_level,
            json_logging,
        }
    }

    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }
}

/// Parse an optional environment variable with `FromStr`, rejecting bad values.
fn parse_env<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::config(format!("Invalid {}: {}", name, e))),
        _ => Ok(None),
    }
}

fn invalid(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

fn validate_environment_name(name: &str) -> std::result::Result<(), ValidationError> {
    if name.is_empty() {
        return Err(invalid("environment", "Environment name cannot be empty".to_string()));
    }
    if name.contains('/') {
        return Err(invalid("environment", format!("Environment '{}' cannot contain '/'", name)));
    }
    Ok(())
}

#[allow(clippy::ptr_arg)]
fn validate_environments(environments: &Vec<String>) -> std::result::Result<(), ValidationError> {
    if environments.is_empty() {
        return Err(invalid("environments", "At least one environment is required".to_string()));
    }

    for (index, name) in environments.iter().enumerate() {
        validate_environment_name(name)?;
        if environments[..index].contains(name) {
            return Err(invalid("environments", format!("Duplicate environment '{}'", name)));
        }
    }

    Ok(())
}
