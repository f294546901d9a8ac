//! Core secret store traits and types.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::Result;

/// Loosely-typed field map returned by reading a leaf path.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Result of listing one namespace path.
///
/// Keys ending in `/` denote sub-namespaces. Order is whatever the backend
/// returned and is preserved by every consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Immediate child keys, relative to the listed path
    pub keys: Vec<String>,

    /// Non-fatal warnings attached by the backend
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Listing {
    /// Create a listing without warnings.
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys, warnings: Vec::new() }
    }

    /// Attach warnings to the listing.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A session against the secret store, bound to one environment.
///
/// Changing environment requires a new session from a [`StoreConnector`].
///
/// # Security Considerations
///
/// - Implementations MUST NOT log field values
/// - Network communication SHOULD use TLS
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Name of the environment this session is bound to.
    fn environment(&self) -> &str;

    /// List the immediate children of `path`.
    ///
    /// An absent namespace yields an empty listing rather than an error.
    ///
    /// # Errors
    ///
    /// - [`StoreError::StoreUnavailable`](super::StoreError::StoreUnavailable) if the call fails
    async fn list(&self, path: &str) -> Result<Listing>;

    /// Read the field map stored at `path`.
    ///
    /// Returns `Ok(None)` when no entry exists at `path`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::StoreUnavailable`](super::StoreError::StoreUnavailable) if the call fails
    async fn read_data(&self, path: &str) -> Result<Option<Fields>>;
}

/// Factory for environment-bound store sessions.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Open a fresh session bound to `environment`.
    async fn connect(&self, environment: &str) -> Result<Arc<dyn SecretStore>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_builder() {
        let listing = Listing::new(vec!["a".to_string(), "b/".to_string()]);
        assert!(!listing.has_warnings());

        let listing = listing.with_warnings(vec!["mount is deprecated".to_string()]);
        assert!(listing.has_warnings());
        assert_eq!(listing.keys, vec!["a", "b/"]);
    }

    #[test]
    fn test_listing_deserializes_without_warnings() {
        let listing: Listing = serde_json::from_str(r#"{"keys":["svc/"]}"#).unwrap();
        assert_eq!(listing, Listing::new(vec!["svc/".to_string()]));
    }
}
