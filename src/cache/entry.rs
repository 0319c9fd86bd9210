//! Cache Entry Module
//!
//! Defines the request identity used as a cache key and the stored response.

use std::time::{SystemTime, UNIX_EPOCH};

use url::Url;
use uuid::Uuid;

use crate::error::{ControllerError, Result};
use crate::models::{FetchRequest, FetchResponse, ResponseType};

// == Request Key ==
/// Request identity: method plus absolute URL without fragment, partitioned
/// by the caller's credentials.
///
/// Responses to credentialed requests are stored under a partition derived
/// from the `Authorization` and `Cookie` headers, so one client can never be
/// served another client's private response. Uncredentialed entries have no
/// partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
    pub partition: Option<String>,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method: method.to_ascii_uppercase(),
            url: url.into(),
            partition: None,
        }
    }

    /// GET identity for a URL.
    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }

    pub fn with_partition(mut self, partition: Option<String>) -> Self {
        self.partition = partition;
        self
    }

    /// The same identity without a credential partition.
    pub fn shared(&self) -> Self {
        Self {
            partition: None,
            ..self.clone()
        }
    }

    /// Stable, non-reversible partition for a set of credentials.
    pub fn partition_for(credentials: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_URL, credentials.as_bytes()).to_string()
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.partition {
            Some(partition) => write!(f, "{} {} [{}]", self.method, self.url, partition),
            None => write!(f, "{} {}", self.method, self.url),
        }
    }
}

// == Cached Response ==
/// A response copy held in a cache store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Storage timestamp (Unix milliseconds)
    pub stored_at: u64,
}

impl CachedResponse {
    // == Constructor ==
    /// Copies a response for storage without checking eligibility.
    pub fn capture(response: &FetchResponse) -> Self {
        Self {
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            body: response.body.clone(),
            stored_at: current_timestamp_ms(),
        }
    }

    // == Cacheability ==
    /// Copies a network response if it may be stored for this request.
    ///
    /// Eligible: GET request, HTTP 200, same-origin (`basic`) type, not redirected.
    pub fn cacheable(request: &FetchRequest, response: &FetchResponse) -> Result<Self> {
        if !request.is_get() {
            return Err(ControllerError::NonCacheableResponse(format!(
                "method {} is not cacheable",
                request.method
            )));
        }
        if response.status != 200 {
            return Err(ControllerError::NonCacheableResponse(format!(
                "status {}",
                response.status
            )));
        }
        if response.response_type != ResponseType::Basic {
            return Err(ControllerError::NonCacheableResponse(format!(
                "response type {:?}",
                response.response_type
            )));
        }
        if response.redirected {
            return Err(ControllerError::NonCacheableResponse(
                "redirected response".to_string(),
            ));
        }
        Ok(Self::capture(response))
    }

    /// Rebuilds a response to hand back to the caller.
    pub fn to_response(&self) -> FetchResponse {
        FetchResponse {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            response_type: ResponseType::Basic,
            redirected: false,
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse("http://app.test").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_key_ignores_fragment() {
        let a = RequestKey::get(&url("/map#top"));
        let b = RequestKey::get(&url("/map"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_distinguishes_query_and_method() {
        assert_ne!(RequestKey::get(&url("/a?x=1")), RequestKey::get(&url("/a?x=2")));
        assert_ne!(
            RequestKey::new("POST", &url("/a")),
            RequestKey::get(&url("/a"))
        );
    }

    #[test]
    fn test_key_partition() {
        let shared = RequestKey::get(&url("/api/auth/me"));
        let alice = shared
            .clone()
            .with_partition(Some(RequestKey::partition_for("Bearer alice")));
        let bob = shared
            .clone()
            .with_partition(Some(RequestKey::partition_for("Bearer bob")));

        assert_ne!(alice, bob);
        assert_ne!(alice, shared);
        assert_eq!(alice.shared(), shared);
        assert_eq!(
            RequestKey::partition_for("Bearer alice"),
            RequestKey::partition_for("Bearer alice")
        );
        assert!(!alice.to_string().contains("alice"));
    }

    #[test]
    fn test_cacheable_accepts_basic_200() {
        let req = FetchRequest::get(url("/app.js"));
        let resp = FetchResponse::new(200, "console.log(1)").with_header("content-type", "text/javascript");
        let cached = CachedResponse::cacheable(&req, &resp).unwrap();
        assert_eq!(cached.body, b"console.log(1)");
        assert_eq!(cached.headers.len(), 1);
    }

    #[test]
    fn test_cacheable_rejects_non_200() {
        let req = FetchRequest::get(url("/missing"));
        let resp = FetchResponse::new(404, "");
        assert!(matches!(
            CachedResponse::cacheable(&req, &resp),
            Err(ControllerError::NonCacheableResponse(_))
        ));
        // 204 is ok but still not 200
        let resp = FetchResponse::new(204, "");
        assert!(CachedResponse::cacheable(&req, &resp).is_err());
    }

    #[test]
    fn test_cacheable_rejects_cross_origin_and_redirects() {
        let req = FetchRequest::get(url("/font.woff"));
        let opaque = FetchResponse::new(200, "x").with_type(ResponseType::Opaque);
        let cors = FetchResponse::new(200, "x").with_type(ResponseType::Cors);
        let redirected = FetchResponse::new(200, "x").with_redirected(true);
        assert!(CachedResponse::cacheable(&req, &opaque).is_err());
        assert!(CachedResponse::cacheable(&req, &cors).is_err());
        assert!(CachedResponse::cacheable(&req, &redirected).is_err());
    }

    #[test]
    fn test_cacheable_rejects_post() {
        let req = FetchRequest::new("POST", url("/api/reports"));
        let resp = FetchResponse::new(200, "{}");
        assert!(CachedResponse::cacheable(&req, &resp).is_err());
    }

    #[test]
    fn test_round_trip_preserves_bytes() {
        let resp = FetchResponse::new(200, vec![0u8, 159, 146, 150]).with_header("etag", "\"1\"");
        let cached = CachedResponse::capture(&resp);
        let back = cached.to_response();
        assert_eq!(back.body, resp.body);
        assert_eq!(back.status, 200);
        assert_eq!(back.header("ETag"), Some("\"1\""));
    }
}
