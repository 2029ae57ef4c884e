//! Request handling helpers.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Extract the connection's peer address and referrer
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Peer address is optional so handlers also work without connect info

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Generates a UUID v4 request ID for every request that lacks one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The TCP peer, when the server was started with connect info.
pub fn peer_addr<B>(request: &Request<B>) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// The Referer header, or empty.
pub fn referer(headers: &HeaderMap) -> &str {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn request_ids_are_unique_uuids() {
        let req = Request::builder().body(Body::empty()).unwrap();
        let mut make = RequestUuid;
        let a = make.make_request_id(&req).unwrap();
        let b = make.make_request_id(&req).unwrap();
        assert_ne!(a.header_value(), b.header_value());
        assert!(Uuid::parse_str(a.header_value().to_str().unwrap()).is_ok());
    }

    #[test]
    fn peer_addr_from_connect_info() {
        let addr: SocketAddr = "192.0.2.10:4000".parse().unwrap();
        let mut req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(peer_addr(&req), None);
        req.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(peer_addr(&req), Some(addr));
    }
}
