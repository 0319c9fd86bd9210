//! Network Fetcher
//!
//! The outbound network seam. `HttpFetcher` passes requests through to the
//! origin (or any third-party host) with reqwest and classifies the response.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::is_hop_by_hop;
use crate::error::{ControllerError, Result};
use crate::models::{FetchRequest, FetchResponse, ResponseType};

/// Performs network requests on behalf of the controller.
///
/// Any failure to obtain a response must be reported as
/// `ControllerError::NetworkUnavailable`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

/// reqwest-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    /// Responses from this origin are classified `basic`
    origin: Url,
}

impl HttpFetcher {
    pub fn new(origin: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ControllerError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, origin })
    }

    fn classify(&self, final_url: &Url) -> ResponseType {
        if final_url.origin() == self.origin.origin() {
            ResponseType::Basic
        } else {
            ResponseType::Cors
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| ControllerError::InvalidRequest(format!("bad method: {}", e)))?;

        let mut builder = self.client.request(method, request.url.clone());
        for (name, value) in &request.headers {
            if is_hop_by_hop(name) || name.eq_ignore_ascii_case("host") {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ControllerError::NetworkUnavailable(e.to_string()))?;

        let mut requested = request.url.clone();
        requested.set_fragment(None);
        let redirected = response.url() != &requested;
        let response_type = self.classify(response.url());
        let status = response.status();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| ControllerError::NetworkUnavailable(e.to_string()))?;

        debug!(
            "Fetched {} {} -> {} ({:?}, redirected={})",
            request.method, request.url, status, response_type, redirected
        );

        Ok(FetchResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body: body.to_vec(),
            response_type,
            redirected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_same_origin_is_basic() {
        let fetcher = HttpFetcher::new(Url::parse("http://app.test:8080").unwrap()).unwrap();
        let same = Url::parse("http://app.test:8080/static/app.js").unwrap();
        let other_port = Url::parse("http://app.test:9090/static/app.js").unwrap();
        let cdn = Url::parse("https://cdn.example.com/leaflet.css").unwrap();

        assert_eq!(fetcher.classify(&same), ResponseType::Basic);
        assert_eq!(fetcher.classify(&other_port), ResponseType::Cors);
        assert_eq!(fetcher.classify(&cdn), ResponseType::Cors);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_unavailable() {
        // Port 9 (discard) on localhost is closed in test environments.
        let origin = Url::parse("http://127.0.0.1:9").unwrap();
        let fetcher = HttpFetcher::new(origin.clone()).unwrap();
        let result = fetcher.fetch(&FetchRequest::get(origin.join("/").unwrap())).await;
        assert!(matches!(result, Err(ControllerError::NetworkUnavailable(_))));
    }
}
