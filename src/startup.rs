//! Startup wiring: configuration to connector to service.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{AppConfig, StoreBackend};
use crate::errors::Result;
use crate::services::{SecretTreeService, TreeSettings};
use crate::store::{MemoryStore, StoreConnector, VaultConnector};

/// Build the store connector selected by `config.store.backend`.
pub fn build_connector(config: &AppConfig) -> Result<Arc<dyn StoreConnector>> {
    match config.store.backend {
        StoreBackend::Vault => {
            if config.vault.token.is_none() {
                warn!("VAULT_TOKEN is not set; Vault calls will be unauthenticated");
            }
            info!(
                address = %config.vault.address,
                namespace = ?config.vault.namespace,
                "Using Vault secret store"
            );
            Ok(Arc::new(VaultConnector::new(config.vault.clone())?))
        }
        StoreBackend::Memory => {
            let store = match config.store.seed_file.as_deref() {
                Some(path) => {
                    info!(seed_file = %path.display(), "Using in-memory secret store");
                    MemoryStore::from_seed_file(path)?
                }
                None => {
                    warn!("Using empty in-memory secret store (KEYTREE_SEED_FILE not set)");
                    MemoryStore::new()
                }
            };
            Ok(Arc::new(store))
        }
    }
}

/// Build the request service for `config`.
pub fn build_service(config: &AppConfig) -> Result<SecretTreeService> {
    let connector = build_connector(config)?;
    Ok(SecretTreeService::new(connector, TreeSettings::from(&config.tree)))
}
