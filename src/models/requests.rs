//! Request DTOs for the control endpoints
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for POST /_sw/sync
#[derive(Debug, Clone, Deserialize)]
pub struct SyncRequest {
    /// Sync tag; only the configured tag triggers reconciliation
    pub tag: String,
}

/// Request body for POST /_sw/notificationclick
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationClickRequest {
    /// Clicked action; empty when the notification body was clicked
    #[serde(default)]
    pub action: String,
}

/// Request body for POST /_sw/queue
#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueRequest {
    /// JSON body to replay
    pub payload: serde_json::Value,
    /// Bearer token used for the replay
    pub token: String,
}

impl EnqueueRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.token.trim().is_empty() {
            return Some("Token cannot be empty".to_string());
        }
        if self.payload.is_null() {
            return Some("Payload cannot be null".to_string());
        }
        None
    }
}
