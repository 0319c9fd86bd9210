//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Background sync: triggers reconciliation of deferred writes at a
//!   configured interval

mod sync;

pub use sync::spawn_sync_task;
