//! Configuration Module
//!
//! Handles loading and managing controller configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;
use url::Url;

use crate::error::ControllerError;

/// Default origin the proxy fronts when `ORIGIN_URL` is unset or invalid.
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8080";

/// Critical assets pre-cached on install.
pub const DEFAULT_MANIFEST: &[&str] = &[
    "/",
    "/static/js/bundle.js",
    "/static/css/main.css",
    "/manifest.json",
    "/favicon.ico",
    "/logo192.png",
    "/logo512.png",
    "/offline.html",
];

// == Install Mode ==
/// How `install` treats manifest entries that fail to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallMode {
    /// One failed entry fails the whole install; nothing is stored.
    Strict,
    /// Store what succeeds, report what fails.
    BestEffort,
}

impl FromStr for InstallMode {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "strict" => Ok(InstallMode::Strict),
            "best_effort" => Ok(InstallMode::BestEffort),
            other => Err(ControllerError::Config(format!(
                "unknown install mode '{}'",
                other
            ))),
        }
    }
}

/// Controller configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Origin server that intercepted requests are resolved against
    pub origin: Url,
    /// HTTP server port
    pub server_port: u16,
    /// Cache store name prefix
    pub cache_prefix: String,
    /// Deployed client version; together with the prefix names the current store
    pub cache_version: String,
    /// Paths pre-cached on install
    pub precache_manifest: Vec<String>,
    /// Install policy for manifest failures
    pub install_mode: InstallMode,
    /// Path of the offline fallback page served to failed navigations
    pub offline_page: String,
    /// Tag that sync triggers must carry
    pub sync_tag: String,
    /// Backend write endpoint deferred writes are replayed against
    pub sync_endpoint: String,
    /// Minimum time between reconciliation passes
    pub sync_min_interval: Duration,
    /// Background sync task interval in seconds (0 disables the task)
    pub sync_task_interval: u64,
    /// SQLite file for the cache stores; in-memory when None
    pub cache_path: Option<String>,
    /// SQLite file for the deferred write queue; in-memory when None
    pub queue_path: Option<String>,
    /// Notification title
    pub app_name: String,
    /// Route opened when a notification's explore action is clicked
    pub notification_route: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `ORIGIN_URL` - Origin server (default: http://127.0.0.1:8080)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_PREFIX` / `CACHE_VERSION` - Store name parts (default: rashtrackr / v1)
    /// - `PRECACHE_MANIFEST` - Comma-separated paths to pre-cache
    /// - `INSTALL_MODE` - strict | best_effort (default: strict)
    /// - `OFFLINE_PAGE` - Offline fallback path (default: /offline.html)
    /// - `SYNC_TAG` - Accepted sync tag (default: background-sync)
    /// - `SYNC_ENDPOINT` - Replay endpoint (default: /api/reports)
    /// - `SYNC_MIN_INTERVAL` - Seconds between reconciliation passes (default: 300)
    /// - `SYNC_TASK_INTERVAL` - Background sync frequency in seconds (default: 60)
    /// - `CACHE_PATH` - SQLite cache file (default: in-memory)
    /// - `QUEUE_PATH` - SQLite queue file (default: in-memory)
    /// - `APP_NAME` - Notification title (default: RashTrackr)
    /// - `NOTIFICATION_ROUTE` - Route for the explore action (default: /dashboard)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let origin = match env::var("ORIGIN_URL") {
            Ok(raw) => Url::parse(&raw).unwrap_or_else(|e| {
                warn!("Ignoring invalid ORIGIN_URL '{}': {}", raw, e);
                defaults.origin.clone()
            }),
            Err(_) => defaults.origin.clone(),
        };

        let install_mode = match env::var("INSTALL_MODE") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}, falling back to strict", e);
                InstallMode::Strict
            }),
            Err(_) => defaults.install_mode,
        };

        Self {
            origin,
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cache_prefix: env::var("CACHE_PREFIX").unwrap_or(defaults.cache_prefix),
            cache_version: env::var("CACHE_VERSION").unwrap_or(defaults.cache_version),
            precache_manifest: env::var("PRECACHE_MANIFEST")
                .map(|v| parse_manifest(&v))
                .unwrap_or(defaults.precache_manifest),
            install_mode,
            offline_page: env::var("OFFLINE_PAGE").unwrap_or(defaults.offline_page),
            sync_tag: env::var("SYNC_TAG").unwrap_or(defaults.sync_tag),
            sync_endpoint: env::var("SYNC_ENDPOINT").unwrap_or(defaults.sync_endpoint),
            sync_min_interval: parse_var("SYNC_MIN_INTERVAL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.sync_min_interval),
            sync_task_interval: parse_var("SYNC_TASK_INTERVAL")
                .unwrap_or(defaults.sync_task_interval),
            cache_path: env::var("CACHE_PATH").ok().filter(|p| !p.is_empty()),
            queue_path: env::var("QUEUE_PATH").ok().filter(|p| !p.is_empty()),
            app_name: env::var("APP_NAME").unwrap_or(defaults.app_name),
            notification_route: env::var("NOTIFICATION_ROUTE")
                .unwrap_or(defaults.notification_route),
        }
    }

    /// Name of the cache store owned by the deployed version.
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.cache_version)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: Url::parse(DEFAULT_ORIGIN).expect("default origin is a valid URL"),
            server_port: 3000,
            cache_prefix: "rashtrackr".to_string(),
            cache_version: "v1".to_string(),
            precache_manifest: DEFAULT_MANIFEST.iter().map(|p| p.to_string()).collect(),
            install_mode: InstallMode::Strict,
            offline_page: "/offline.html".to_string(),
            sync_tag: "background-sync".to_string(),
            sync_endpoint: "/api/reports".to_string(),
            sync_min_interval: Duration::from_secs(5 * 60),
            sync_task_interval: 60,
            cache_path: None,
            queue_path: None,
            app_name: "RashTrackr".to_string(),
            notification_route: "/dashboard".to_string(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn parse_manifest(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cache_name(), "rashtrackr-v1");
        assert_eq!(config.install_mode, InstallMode::Strict);
        assert_eq!(config.sync_min_interval, Duration::from_secs(300));
        assert_eq!(config.sync_tag, "background-sync");
        assert!(config.precache_manifest.contains(&"/offline.html".to_string()));
        assert!(config.cache_path.is_none());
        assert!(config.queue_path.is_none());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for var in [
            "ORIGIN_URL",
            "SERVER_PORT",
            "CACHE_PREFIX",
            "CACHE_VERSION",
            "PRECACHE_MANIFEST",
            "INSTALL_MODE",
            "SYNC_MIN_INTERVAL",
            "CACHE_PATH",
            "QUEUE_PATH",
        ] {
            env::remove_var(var);
        }

        let config = Config::from_env();
        assert_eq!(config.origin.as_str(), "http://127.0.0.1:8080/");
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cache_name(), "rashtrackr-v1");
        assert_eq!(config.precache_manifest.len(), DEFAULT_MANIFEST.len());
        assert!(config.cache_path.is_none());
    }

    #[test]
    fn test_install_mode_parse() {
        assert_eq!("strict".parse::<InstallMode>().unwrap(), InstallMode::Strict);
        assert_eq!(
            "best-effort".parse::<InstallMode>().unwrap(),
            InstallMode::BestEffort
        );
        assert_eq!(
            "BEST_EFFORT".parse::<InstallMode>().unwrap(),
            InstallMode::BestEffort
        );
        assert!("lenient".parse::<InstallMode>().is_err());
    }

    #[test]
    fn test_parse_manifest_skips_blanks() {
        let manifest = parse_manifest(" /, /app.js ,,/app.css ");
        assert_eq!(manifest, vec!["/", "/app.js", "/app.css"]);
    }
}
