//! Request classification.
//!
//! # Responsibilities
//! - Decide, per request, between the favicon short-circuit, the admin
//!   surface and forwarding dispatch
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Favicon is checked first, for every host
//! - Explicit variants rather than a silent default

use axum::body::Body;
use axum::http::Request;

use crate::routing::matcher::{HostMatcher, Matcher, PathMatcher};

/// Path answered with 404 before any other work.
pub const FAVICON_PATH: &str = "/favicon.ico";

/// Where a request is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Favicon,
    Admin,
    Forward,
}

/// Classifies requests by path and Host header.
#[derive(Debug)]
pub struct Router {
    favicon: PathMatcher,
    admin: HostMatcher,
}

impl Router {
    pub fn new(admin_host: &str) -> Self {
        Self {
            favicon: PathMatcher::new(FAVICON_PATH),
            admin: HostMatcher::new(admin_host),
        }
    }

    /// Classify a request.
    pub fn classify(&self, req: &Request<Body>) -> Route {
        if self.favicon.matches(req) {
            Route::Favicon
        } else if self.admin.matches(req) {
            Route::Admin
        } else {
            Route::Forward
        }
    }
}
