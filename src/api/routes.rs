//! API Routes
//!
//! Configures the Axum router: control endpoints under `/_sw` and a
//! fallback that intercepts everything else.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    activate_handler, enqueue_handler, health_handler, install_handler, intercept_handler,
    list_queue_handler, notification_click_handler, push_handler, stats_handler, sync_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /_sw/install` - Pre-cache the asset manifest
/// - `POST /_sw/activate` - Delete caches of other versions
/// - `POST /_sw/sync` - Trigger reconciliation of deferred writes
/// - `POST /_sw/push` - Build a notification for a push payload
/// - `POST /_sw/notificationclick` - Resolve a notification action
/// - `GET|POST /_sw/queue` - List or add deferred writes
/// - `GET /_sw/stats` - Serving statistics
/// - `GET /_sw/health` - Health check endpoint
/// - anything else - intercepted by the cache-first serving policy
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/_sw/install", post(install_handler))
        .route("/_sw/activate", post(activate_handler))
        .route("/_sw/sync", post(sync_handler))
        .route("/_sw/push", post(push_handler))
        .route("/_sw/notificationclick", post(notification_click_handler))
        .route("/_sw/queue", get(list_queue_handler).post(enqueue_handler))
        .route("/_sw/stats", get(stats_handler))
        .route("/_sw/health", get(health_handler))
        .fallback(intercept_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
