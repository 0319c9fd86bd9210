//! Network Module
//!
//! Outbound fetching and the response interceptor chain.

mod fetcher;
mod interceptor;

pub use fetcher::{Fetcher, HttpFetcher};
pub use interceptor::{
    InterceptorChain, RateLimitInterceptor, RateLimitStats, ResponseInterceptor,
    DEFAULT_RETRY_AFTER_SECS,
};

/// Connection-scoped headers that must not be forwarded or stored.
pub fn is_hop_by_hop(name: &str) -> bool {
    const HOP_BY_HOP: &[&str] = &[
        "connection",
        "keep-alive",
        "proxy-authenticate",
        "proxy-authorization",
        "te",
        "trailer",
        "transfer-encoding",
        "upgrade",
        "content-length",
    ];
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}
