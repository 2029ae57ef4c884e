//! Request matching logic.
//!
//! # Responsibilities
//! - Match host header (exact match, case-insensitive, port ignored)
//! - Match exact paths
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching

use axum::body::Body;
use axum::http::{header, Request};

use crate::routing::host::strip_port;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request<Body>) -> bool;
}

/// The request's host: the Host header, or the URI authority for absolute-form requests.
pub fn request_host(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().host())
}

/// Matches the Host header.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// Create a new host matcher.
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: strip_port(&host.into()).to_lowercase(),
        }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        request_host(req)
            .map(|h| strip_port(h).eq_ignore_ascii_case(&self.expected_host))
            .unwrap_or(false)
    }
}

/// Matches one exact request path.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    path: String,
}

impl PathMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for PathMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        req.uri().path() == self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_matcher() {
        let matcher = HostMatcher::new("subfwd.com");

        let req1 = Request::builder()
            .header("Host", "subfwd.com")
            .body(Body::default())
            .unwrap();
        assert!(matcher.matches(&req1));

        let req2 = Request::builder()
            .header("Host", "SUBFWD.COM:3000")
            .body(Body::default())
            .unwrap();
        assert!(matcher.matches(&req2)); // Case and port insensitive

        let req3 = Request::builder()
            .header("Host", "www.subfwd.com")
            .body(Body::default())
            .unwrap();
        assert!(!matcher.matches(&req3));

        let req4 = Request::builder().body(Body::default()).unwrap();
        assert!(!matcher.matches(&req4));
    }

    #[test]
    fn test_path_matcher() {
        let matcher = PathMatcher::new("/favicon.ico");

        let req1 = Request::builder()
            .uri("http://example.com/favicon.ico")
            .body(Body::default())
            .unwrap();
        assert!(matcher.matches(&req1));

        let req2 = Request::builder()
            .uri("http://example.com/favicon.ico/x")
            .body(Body::default())
            .unwrap();
        assert!(!matcher.matches(&req2));
    }
}
