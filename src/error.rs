//! Error types for the offline cache controller
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Controller Error Enum ==
/// Unified error type for the offline cache controller.
///
/// A cache miss is not represented here: lookups return `Option`.
#[derive(Error, Debug)]
pub enum ControllerError {
    /// The network attempt failed entirely (offline, DNS, timeout)
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Response is not eligible for storage (opaque, non-200, redirected)
    #[error("Non-cacheable response: {0}")]
    NonCacheableResponse(String),

    /// Any other failure inside the serving path
    #[error("Unexpected failure: {0}")]
    UnexpectedFailure(String),

    /// A single deferred write could not be replayed
    #[error("Failed to replay deferred write {id}: {reason}")]
    ReconciliationItemFailure { id: String, reason: String },

    /// Cache storage or write queue backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Pre-caching the asset manifest failed
    #[error("Install failed: {0}")]
    Install(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for ControllerError {
    fn from(err: rusqlite::Error) -> Self {
        ControllerError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ControllerError {
    fn from(err: serde_json::Error) -> Self {
        ControllerError::Storage(format!("serialization: {}", err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ControllerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ControllerError::NetworkUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ControllerError::NonCacheableResponse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ControllerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ControllerError::Install(_) => StatusCode::BAD_GATEWAY,
            ControllerError::UnexpectedFailure(_)
            | ControllerError::ReconciliationItemFailure { .. }
            | ControllerError::Storage(_)
            | ControllerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the controller.
pub type Result<T> = std::result::Result<T, ControllerError>;
