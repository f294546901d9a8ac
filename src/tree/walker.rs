//! One level of namespace traversal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::path::join_path;
use crate::store::{Result, SecretStore, StoreError};

/// What to do when a listing succeeds but carries backend warnings.
///
/// Warnings are always logged; this only decides whether they abort the
/// enclosing request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingWarnings {
    #[default]
    Ignore,
    Fatal,
}

impl FromStr for ListingWarnings {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "fatal" => Ok(Self::Fatal),
            other => Err(format!("unknown listing warning policy '{}'", other)),
        }
    }
}

impl fmt::Display for ListingWarnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => write!(f, "ignore"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// List `path` and return the full path of every child, in listing order.
///
/// A list error is returned as-is and aborts the caller. An absent namespace
/// yields an empty sequence.
pub async fn list_children(
    store: &dyn SecretStore,
    path: &str,
    warnings: ListingWarnings,
) -> Result<Vec<String>> {
    let listing = store.list(path).await?;

    if listing.has_warnings() {
        for warning in &listing.warnings {
            tracing::warn!(
                environment = %store.environment(),
                path = %path,
                warning = %warning,
                "Secret store returned a listing warning"
            );
        }
        if warnings == ListingWarnings::Fatal {
            return Err(StoreError::warning(path, listing.warnings));
        }
    }

    Ok(listing.keys.iter().map(|key| join_path(path, key)).collect())
}
