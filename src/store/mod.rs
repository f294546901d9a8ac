//! Secret store access.
//!
//! The request handlers and the tree builder only see the [`SecretStore`]
//! trait: a session bound to one environment that can list a namespace path
//! and read the field map stored at a leaf path. Sessions are produced by a
//! [`StoreConnector`].
//!
//! # Backends
//!
//! - **HashiCorp Vault** ([`VaultConnector`]): KV v2 mounts, one environment
//!   per path prefix below each mount
//! - **In-memory** ([`MemoryStore`]): tests and local development, with fault
//!   injection and YAML seeding

pub mod client;
pub mod error;
pub mod memory;
pub mod types;
pub mod vault;

pub use client::{Fields, Listing, SecretStore, StoreConnector};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use types::SecretToken;
pub use vault::{VaultConfig, VaultConnector};

/// Mounts whose contents are shared by every environment.
pub const SHARED_MOUNTS: &[&str] = &["templates"];

/// Whether `path` lives under a mount shared by every environment.
pub fn is_shared_path(path: &str) -> bool {
    let mount = path.split('/').next().unwrap_or_default();
    SHARED_MOUNTS.contains(&mount)
}
