//! API Module
//!
//! HTTP adapter between the hosting runtime and the controller.
//!
//! # Endpoints
//! - `POST /_sw/install`, `POST /_sw/activate` - Lifecycle transitions
//! - `POST /_sw/sync` - Reconcile deferred writes
//! - `POST /_sw/push`, `POST /_sw/notificationclick` - Notification output
//! - `GET|POST /_sw/queue` - Deferred write queue
//! - `GET /_sw/stats`, `GET /_sw/health` - Introspection
//! - Everything else - intercepted fetches

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
