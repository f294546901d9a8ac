//! # keytree
//!
//! A read-only facade over a hierarchically namespaced secret store,
//! organised as Environment → Service → File → Key/Value.
//!
//! ## Architecture
//!
//! ```text
//! RPC API (axum) → SecretTreeService → TreeBuilder / walker → SecretStore (Vault | memory)
//! ```
//!
//! ## Core Components
//!
//! - **Store** ([`store`]): environment-bound sessions that list namespace
//!   paths and read leaf field maps
//! - **Tree** ([`tree`]): path helpers, one-level listing, typed leaf
//!   decoding, and full tree materialization
//! - **Services** ([`services`]): the four request operations
//! - **API** ([`api`]): Twirp-style HTTP/JSON routes
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use keytree::{services::{SecretTreeService, TreeSettings}, store::MemoryStore};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> keytree::Result<()> {
//!     let service = SecretTreeService::new(Arc::new(MemoryStore::new()), TreeSettings::default());
//!     let tree = service.get_full_tree(&CancellationToken::new()).await?;
//!     println!("{}", tree.environments.len());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod services;
pub mod startup;
pub mod store;
pub mod tree;

pub use config::AppConfig;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
