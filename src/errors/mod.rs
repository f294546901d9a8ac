//! # Error Handling
//!
//! Process-level errors: startup, configuration, and transport failures.
//! Errors raised while serving a request are [`StoreError`]s and are mapped
//! to wire responses by the API layer.

use crate::store::StoreError;

/// Custom result type for keytree process operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the keytree process
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network transport errors (HTTP listener, metrics exporter)
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Secret store errors surfaced outside a request (e.g. the `tree` command)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or_else(|| e.code.to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::config(format!("Validation failed: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        assert_eq!(Error::config("bad port").to_string(), "Configuration error: bad port");
        assert_eq!(Error::transport("bind failed").to_string(), "Transport error: bind failed");
        assert_eq!(Error::internal("oops").to_string(), "Internal error: oops");
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err: Error = StoreError::not_found("No file app.yml under billing").into();
        assert_eq!(err.to_string(), "No file app.yml under billing");
        assert!(matches!(err, Error::Store(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_io_conversion() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
