//! # Configuration Management
//!
//! Configuration is read from environment variables. A `.env` file in the
//! working directory is loaded first when present, so local development can
//! keep settings out of the shell.
//!
//! | Variable | Default |
//! |---|---|
//! | `KEYTREE_API_BIND_ADDRESS` / `KEYTREE_API_PORT` | `0.0.0.0` / `8008` |
//! | `KEYTREE_STORE_BACKEND` | `vault` (`memory` for local seeds) |
//! | `KEYTREE_SEED_FILE` | unset |
//! | `VAULT_ADDR`, `VAULT_TOKEN`, `VAULT_NAMESPACE`, `VAULT_CACERT` | see `store::VaultConfig` |
//! | `KEYTREE_ENVIRONMENTS` | `dev,QA,local,secrets` |
//! | `KEYTREE_DEFAULT_ENV` | `dev` |
//! | `KEYTREE_LISTING_WARNINGS` | `ignore` |
//! | `KEYTREE_TREE_FAN_OUT` | `sequential` |
//! | `KEYTREE_REQUEST_TIMEOUT_SECONDS` | `60` |
//! | `KEYTREE_LOG_LEVEL` / `KEYTREE_JSON_LOGGING` | `info` / `false` |
//! | `KEYTREE_ENABLE_METRICS` / `KEYTREE_METRICS_PORT` | `false` / `9090` |

pub mod settings;

pub use settings::{
    ApiServerConfig, AppConfig, ObservabilityConfig, StoreBackend, StoreConfig, TreeConfig,
};

use crate::errors::Result;

/// Load `.env` if present, then read and validate the full configuration.
pub fn load() -> Result<AppConfig> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let config = AppConfig::from_env()?;
    config.validate()?;
    Ok(config)
}
