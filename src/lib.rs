//! Offline Cache - an offline-first cache controller
//!
//! Serves a client application cache-first with network fallback, keeps a
//! versioned pre-cached asset set, and replays writes deferred while offline.

pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod models;
pub mod net;
pub mod queue;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use controller::OfflineController;
pub use tasks::spawn_sync_task;
