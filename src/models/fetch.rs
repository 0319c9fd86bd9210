//! Intercepted request and response types
//!
//! Host-agnostic representations of what passes through the controller.
//! The HTTP adapter converts to and from these; the controller never sees
//! a framework type.

use url::Url;

use crate::cache::RequestKey;

// == Request Mode ==
/// Purpose of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Loads a full document
    Navigate,
    /// Same-origin sub-resource or API call
    SameOrigin,
    /// Cross-origin request with CORS
    Cors,
    /// Cross-origin request without CORS
    NoCors,
}

impl RequestMode {
    /// Parses a `Sec-Fetch-Mode` header value.
    pub fn from_fetch_mode(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "navigate" => Some(RequestMode::Navigate),
            "same-origin" => Some(RequestMode::SameOrigin),
            "cors" => Some(RequestMode::Cors),
            "no-cors" => Some(RequestMode::NoCors),
            _ => None,
        }
    }
}

// == Fetch Request ==
/// An outgoing request issued by the client application.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Upper-case HTTP method
    pub method: String,
    /// Absolute URL
    pub url: Url,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl FetchRequest {
    /// Creates a request with the given method.
    pub fn new(method: impl AsRef<str>, url: Url) -> Self {
        Self {
            method: method.as_ref().to_ascii_uppercase(),
            url,
            mode: RequestMode::SameOrigin,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Creates a GET sub-resource request.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Creates a GET navigation request.
    pub fn navigate(url: Url) -> Self {
        Self::get(url).with_mode(RequestMode::Navigate)
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Case-insensitive header lookup; returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Token from an `Authorization: Bearer <token>` header.
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.header("authorization")?;
        let (scheme, token) = value.split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
    }

    /// Digest of the `Authorization` and `Cookie` headers, if either is sent.
    pub fn credential_partition(&self) -> Option<String> {
        let authorization = self.header("authorization");
        let cookie = self.header("cookie");
        if authorization.is_none() && cookie.is_none() {
            return None;
        }
        let credentials = format!(
            "authorization={}\ncookie={}",
            authorization.unwrap_or(""),
            cookie.unwrap_or("")
        );
        Some(RequestKey::partition_for(&credentials))
    }

    /// Identity used for cache lookups.
    pub fn cache_key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url).with_partition(self.credential_partition())
    }
}

// == Response Type ==
/// Classification of a response, mirroring what a browser exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// Same-origin response, fully readable
    Basic,
    /// Cross-origin response served with CORS
    Cors,
    /// Cross-origin response without CORS; status and body hidden
    Opaque,
    /// Redirect captured without following
    OpaqueRedirect,
    /// Locally constructed response
    Default,
}

// == Fetch Response ==
/// A response returned to the client application.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub response_type: ResponseType,
    /// True when the network followed at least one redirect
    pub redirected: bool,
}

impl FetchResponse {
    /// Creates a same-origin response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: canonical_reason(status).to_string(),
            headers: Vec::new(),
            body: body.into(),
            response_type: ResponseType::Basic,
            redirected: false,
        }
    }

    /// Creates a locally constructed placeholder with an empty body.
    pub fn synthetic(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers: Vec::new(),
            body: Vec::new(),
            response_type: ResponseType::Default,
            redirected: false,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn with_redirected(mut self, redirected: bool) -> Self {
        self.redirected = redirected;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// True for any 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_synthetic(&self) -> bool {
        self.response_type == ResponseType::Default
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn canonical_reason(status: u16) -> &'static str {
    axum::http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}
