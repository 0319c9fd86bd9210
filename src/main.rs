//! Offline Cache - an offline-first cache controller
//!
//! Runs the controller as an HTTP proxy in front of the origin server.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use offline_cache::{create_router, spawn_sync_task, AppState, Config};

/// Main entry point for the offline cache controller.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Wire storage, fetcher and write queue into the controller
/// 4. Install the asset manifest, then activate the current version
/// 5. Start the background sync task
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offline_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting offline cache controller");

    let config = Config::from_env();
    info!(
        "Configuration loaded: origin={}, cache={}, manifest={} paths, port={}, sync_interval={}s",
        config.origin,
        config.cache_name(),
        config.precache_manifest.len(),
        config.server_port,
        config.sync_task_interval
    );

    let state = AppState::from_config(&config).context("failed to initialize controller")?;

    state.controller.start().await;

    let sync_handle = (config.sync_task_interval > 0)
        .then(|| spawn_sync_task(state.controller.clone(), config.sync_task_interval));
    if sync_handle.is_none() {
        info!("Background sync task disabled");
    }

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sync_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sync task and allows graceful shutdown.
async fn shutdown_signal(sync_handle: Option<tokio::task::JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = sync_handle {
        handle.abort();
        warn!("Background sync task aborted");
    }
}
