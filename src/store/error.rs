//! Error types for secret store operations.

use thiserror::Error;

/// Result type for secret store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by the store client, the tree builder, and the request handlers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The underlying list/read call itself failed (network, auth, backend).
    #[error("Secret store unavailable at '{path}': {message}")]
    StoreUnavailable { path: String, message: String },

    /// The store succeeded but attached warnings to a listing that must be clean.
    #[error("Warnings generated from vault {subject}")]
    StoreWarning { subject: String, warnings: Vec<String> },

    /// A read succeeded but returned no data for the requested leaf path.
    #[error("{message}")]
    NotFound { message: String },

    /// A leaf field is missing or does not have the expected type.
    #[error("Malformed value at '{path}': field '{field}' is not a {expected}")]
    MalformedValue { path: String, field: String, expected: &'static str },

    /// The caller cancelled the request or its deadline elapsed.
    #[error("Request cancelled")]
    Cancelled,

    /// A request argument would address a different namespace than intended.
    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },
}

impl StoreError {
    /// Create a store unavailable error.
    pub fn unavailable(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreUnavailable { path: path.into(), message: message.into() }
    }

    /// Create a store warning error.
    pub fn warning(subject: impl Into<String>, warnings: Vec<String>) -> Self {
        Self::StoreWarning { subject: subject.into(), warnings }
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    /// Create a malformed value error.
    pub fn malformed(
        path: impl Into<String>,
        field: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::MalformedValue { path: path.into(), field: field.into(), expected }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument { field: field.into(), reason: reason.into() }
    }

    /// Short, stable label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::StoreWarning { .. } => "store_warning",
            Self::NotFound { .. } => "not_found",
            Self::MalformedValue { .. } => "malformed_value",
            Self::Cancelled => "cancelled",
            Self::InvalidArgument { .. } => "invalid_argument",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let err = StoreError::not_found("No file app.yml under billing");
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(err.to_string(), "No file app.yml under billing");

        let err = StoreError::unavailable("values/", "connection refused");
        assert!(matches!(err, StoreError::StoreUnavailable { .. }));
        assert!(err.to_string().contains("values/"));

        let err = StoreError::warning("billing", vec!["deprecated mount".to_string()]);
        assert_eq!(err.to_string(), "Warnings generated from vault billing");
    }

    #[test]
    fn test_malformed_display() {
        let err = StoreError::malformed("verification/billing", "verified", "bool");
        assert_eq!(
            err.to_string(),
            "Malformed value at 'verification/billing': field 'verified' is not a bool"
        );
    }

    #[test]
    fn test_kind_labels_are_distinct() {
        let kinds = [
            StoreError::unavailable("p", "m").kind(),
            StoreError::warning("s", vec![]).kind(),
            StoreError::not_found("m").kind(),
            StoreError::malformed("p", "f", "string").kind(),
            StoreError::Cancelled.kind(),
            StoreError::invalid_argument("service", "empty").kind(),
        ];
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
    }
}
