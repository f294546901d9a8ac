//! Wire errors in the Twirp convention: `{"code": "...", "msg": "...", "meta": {...}}`.

use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json,
};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Request body could not be decoded
    Malformed(String),
    InvalidArgument(String),
    NotFound(String),
    /// Listing succeeded with warnings that this call treats as fatal
    FailedPrecondition { msg: String, warnings: Vec<String> },
    Unavailable(String),
    Canceled(String),
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Malformed(_) | ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::FailedPrecondition { .. } => StatusCode::PRECONDITION_FAILED,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Canceled(_) => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Twirp error code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Malformed(_) => "malformed",
            ApiError::InvalidArgument(_) => "invalid_argument",
            ApiError::NotFound(_) => "not_found",
            ApiError::FailedPrecondition { .. } => "failed_precondition",
            ApiError::Unavailable(_) => "unavailable",
            ApiError::Canceled(_) => "canceled",
            ApiError::Internal(_) => "internal",
        }
    }
}

/// Error body returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub msg: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let code = self.code().to_string();

        let mut meta = BTreeMap::new();
        let msg = match self {
            ApiError::FailedPrecondition { msg, warnings } => {
                meta.insert("warnings".to_string(), warnings.join("; "));
                msg
            }
            ApiError::Malformed(msg)
            | ApiError::InvalidArgument(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unavailable(msg)
            | ApiError::Canceled(msg)
            | ApiError::Internal(msg) => msg,
        };

        (status, Json(ErrorBody { code, msg, meta })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let msg = err.to_string();
        match err {
            StoreError::InvalidArgument { .. } => ApiError::InvalidArgument(msg),
            StoreError::NotFound { .. } => ApiError::NotFound(msg),
            StoreError::StoreWarning { warnings, .. } => {
                ApiError::FailedPrecondition { msg, warnings }
            }
            StoreError::StoreUnavailable { .. } => ApiError::Unavailable(msg),
            StoreError::Cancelled => ApiError::Canceled(msg),
            StoreError::MalformedValue { .. } => ApiError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed(rejection.body_text())
    }
}
