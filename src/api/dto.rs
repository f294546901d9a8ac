//! Request and response bodies for the RPC routes.
//!
//! Responses reuse the [`crate::tree`] model types directly. Missing request
//! fields decode as empty strings and are rejected by the service as invalid
//! arguments.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListServiceTemplatesRequest {
    pub service: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetTemplateRequest {
    pub service: String,
    pub file: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateRequest {
    pub service: String,
    pub env: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" when responding
    pub status: String,
}
