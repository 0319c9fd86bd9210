//! Request and response models
//!
//! Intercepted fetch types plus the DTOs used by the control endpoints.

pub mod fetch;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use fetch::{FetchRequest, FetchResponse, RequestMode, ResponseType};
pub use requests::{EnqueueRequest, NotificationClickRequest, SyncRequest};
pub use responses::{ActivateResponse, HealthResponse, NotificationClickResponse, StatsResponse};
