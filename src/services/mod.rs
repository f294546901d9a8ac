//! Business logic services
//!
//! Request handling separated from HTTP concerns, so the same operations back
//! both the RPC routes and the `tree` command.

pub mod tree_service;

pub use tree_service::{SecretTreeService, TreeSettings};
