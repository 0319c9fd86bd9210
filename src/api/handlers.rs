//! API Handlers
//!
//! Bridges HTTP to the controller: lifecycle control endpoints plus the
//! fallback handler that intercepts every other request.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};
use url::Url;

use crate::cache::{CacheStorage, MemoryCacheStorage, SqliteCacheStorage};
use crate::config::Config;
use crate::controller::{InstallReport, Notification, OfflineController, SyncOutcome};
use crate::error::{ControllerError, Result};
use crate::models::{
    ActivateResponse, EnqueueRequest, FetchRequest, FetchResponse, HealthResponse,
    NotificationClickRequest, NotificationClickResponse, RequestMode, StatsResponse, SyncRequest,
};
use crate::net::{is_hop_by_hop, HttpFetcher};
use crate::queue::{DeferredWrite, MemoryWriteQueue, SqliteWriteQueue, WriteQueue};

/// Largest request body the interceptor will buffer.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Header carrying the status text of synthetic responses.
pub const STATUS_TEXT_HEADER: &str = "x-status-text";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<OfflineController>,
}

impl AppState {
    pub fn new(controller: OfflineController) -> Self {
        Self {
            controller: Arc::new(controller),
        }
    }

    /// Creates the production wiring from configuration: reqwest fetcher,
    /// plus SQLite cache storage and queue when their paths are set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage: Arc<dyn CacheStorage> = match &config.cache_path {
            Some(path) => {
                info!("Using SQLite cache storage at {}", path);
                Arc::new(SqliteCacheStorage::open(path)?)
            }
            None => Arc::new(MemoryCacheStorage::new()),
        };
        let fetcher = Arc::new(HttpFetcher::new(config.origin.clone())?);
        let queue: Arc<dyn WriteQueue> = match &config.queue_path {
            Some(path) => {
                info!("Using SQLite write queue at {}", path);
                Arc::new(SqliteWriteQueue::open(path)?)
            }
            None => Arc::new(MemoryWriteQueue::new()),
        };

        let controller = OfflineController::new(config.clone(), storage, fetcher, queue)?;
        Ok(Self::new(controller))
    }
}

/// Handler for POST /_sw/install
pub async fn install_handler(State(state): State<AppState>) -> Result<Json<InstallReport>> {
    Ok(Json(state.controller.install().await?))
}

/// Handler for POST /_sw/activate
pub async fn activate_handler(State(state): State<AppState>) -> Result<Json<ActivateResponse>> {
    let deleted = state.controller.activate().await?;
    Ok(Json(ActivateResponse {
        current: state.controller.cache_name().to_string(),
        deleted,
    }))
}

/// Handler for POST /_sw/sync
pub async fn sync_handler(
    State(state): State<AppState>,
    Json(req): Json<SyncRequest>,
) -> Json<SyncOutcome> {
    Json(state.controller.sync(&req.tag).await)
}

/// Handler for POST /_sw/push
///
/// The raw request body is the push payload text.
pub async fn push_handler(State(state): State<AppState>, body: String) -> Json<Notification> {
    let payload = Some(body.as_str()).filter(|text| !text.is_empty());
    Json(state.controller.push(payload))
}

/// Handler for POST /_sw/notificationclick
pub async fn notification_click_handler(
    State(state): State<AppState>,
    Json(req): Json<NotificationClickRequest>,
) -> Json<NotificationClickResponse> {
    Json(NotificationClickResponse {
        open: state.controller.notification_click(&req.action),
    })
}

/// Handler for GET /_sw/queue
pub async fn list_queue_handler(State(state): State<AppState>) -> Result<Json<Vec<DeferredWrite>>> {
    Ok(Json(state.controller.queue().list_pending().await?))
}

/// Handler for POST /_sw/queue
pub async fn enqueue_handler(
    State(state): State<AppState>,
    Json(req): Json<EnqueueRequest>,
) -> Result<(StatusCode, Json<DeferredWrite>)> {
    if let Some(error_msg) = req.validate() {
        return Err(ControllerError::InvalidRequest(error_msg));
    }

    let item = DeferredWrite::new(req.payload, req.token);
    state.controller.queue().enqueue(item.clone()).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Handler for GET /_sw/stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let controller = &state.controller;
    let cached_entries = controller.storage().len(controller.cache_name()).await?;
    let pending_writes = controller.queue().len().await?;

    Ok(Json(StatsResponse::new(
        controller.cache_name(),
        cached_entries,
        pending_writes,
        controller.stats().await,
        controller.rate_limit_stats(),
    )))
}

/// Handler for GET /_sw/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Fallback handler: every request that is not a control endpoint goes
/// through the controller's serving policy.
pub async fn intercept_handler(State(state): State<AppState>, request: Request) -> Response {
    let fetch_request = match to_fetch_request(state.controller.config(), request).await {
        Ok(fetch_request) => fetch_request,
        Err(err) => {
            warn!("Rejected intercepted request: {}", err);
            return into_http_response(FetchResponse::synthetic(500, "Service Worker Error"));
        }
    };

    let response = state.controller.handle_fetch(fetch_request).await;
    into_http_response(response)
}

/// Converts an incoming HTTP request into an intercepted fetch.
///
/// Only the path and query of the request target are used; scheme, host and
/// port always come from the configured origin.
pub async fn to_fetch_request(config: &Config, request: Request) -> Result<FetchRequest> {
    let (parts, body) = request.into_parts();

    let url = origin_url(&config.origin, &parts.uri)?;

    let headers: Vec<(String, String)> = parts
        .headers
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name.as_str()) && name.as_str() != "host")
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ControllerError::InvalidRequest(format!("unreadable body: {}", e)))?;

    let mut fetch_request = FetchRequest::new(parts.method.as_str(), url)
        .with_mode(request_mode(&parts.method, &parts.headers));
    fetch_request.headers = headers;
    if !body.is_empty() {
        fetch_request.body = Some(body.to_vec());
    }
    Ok(fetch_request)
}

/// Places the request target's path and query on the origin.
fn origin_url(origin: &Url, uri: &Uri) -> Result<Url> {
    let mut url = origin.clone();
    url.set_path(uri.path());
    url.set_query(uri.query());

    if url.origin() != origin.origin() {
        return Err(ControllerError::InvalidRequest(format!(
            "request target {} leaves the origin",
            uri
        )));
    }
    Ok(url)
}

/// `Sec-Fetch-Mode` when present; otherwise a GET preferring HTML is
/// treated as a navigation.
fn request_mode(method: &Method, headers: &HeaderMap) -> RequestMode {
    if let Some(mode) = headers
        .get("sec-fetch-mode")
        .and_then(|v| v.to_str().ok())
        .and_then(RequestMode::from_fetch_mode)
    {
        return mode;
    }

    let wants_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false);

    if *method == Method::GET && wants_html {
        RequestMode::Navigate
    } else {
        RequestMode::SameOrigin
    }
}

/// Converts the controller's response back into an HTTP response.
pub fn into_http_response(response: FetchResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status);
    for (name, value) in &response.headers {
        if !is_hop_by_hop(name) {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }
    if response.is_synthetic() {
        builder = builder.header(STATUS_TEXT_HEADER, response.status_text.as_str());
    }

    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
