//! Reverse proxy to a resolved target.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the target (single-host semantics: target
//!   path joined with request path, queries combined)
//! - Rewrite Host to the target's authority, append X-Forwarded-For
//! - Stream the upstream response back without buffering
//!
//! # Design Decisions
//! - One pooled client shared by every request
//! - Plain HTTP and HTTPS targets through the same connector
//! - Hop-by-hop headers stripped in both directions

use std::net::IpAddr;

use axum::body::Body;
use axum::http::uri::InvalidUri;
use axum::http::{header, HeaderMap, HeaderValue, Request, Uri, Version};
use axum::response::Response;
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::http::response::strip_hop_by_hop;
use crate::template::X_FORWARDED_FOR;

/// Error type for proxy operations.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("target has no host")]
    NoHost,
    #[error("invalid upstream URI: {0}")]
    Uri(#[from] InvalidUri),
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// HTTP client used for proxied requests.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client<HttpsConnector<HttpConnector>, Body>,
}

impl UpstreamClient {
    /// Build the client with the ring crypto provider; no process default is consulted.
    pub fn new() -> Result<Self, rustls::Error> {
        let https = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
            .https_or_http()
            .enable_http1()
            .build();

        Ok(Self {
            client: Client::builder(TokioExecutor::new()).build(https),
        })
    }

    /// Forward `request` to `target` and return the upstream response.
    pub async fn proxy(
        &self,
        target: &Url,
        request: Request<Body>,
        peer: Option<IpAddr>,
    ) -> Result<Response, ProxyError> {
        let (mut parts, body) = request.into_parts();

        parts.uri = upstream_uri(target, &parts.uri)?;
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);

        let authority = target_authority(target).ok_or(ProxyError::NoHost)?;
        if let Ok(host) = HeaderValue::from_str(&authority) {
            parts.headers.insert(header::HOST, host);
        }

        if let Some(peer) = peer {
            append_forwarded_for(&mut parts.headers, peer);
        }

        tracing::debug!(upstream = %parts.uri, host = %authority, "Proxying request");

        let response: hyper::Response<Incoming> =
            self.client.request(Request::from_parts(parts, body)).await?;
        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);

        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Append the connection peer to X-Forwarded-For, keeping any prior hops.
pub fn append_forwarded_for(headers: &mut HeaderMap, peer: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    let forwarded = if prior.is_empty() {
        peer.to_string()
    } else {
        format!("{}, {}", prior.join(", "), peer)
    };
    if let Ok(value) = HeaderValue::from_str(&forwarded) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

/// `host[:port]` of the target, port only when not the scheme default.
pub fn target_authority(target: &Url) -> Option<String> {
    let host = target.host_str()?;
    Some(match target.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Map an incoming request URI onto the target URL.
pub fn upstream_uri(target: &Url, incoming: &Uri) -> Result<Uri, InvalidUri> {
    let mut url = target.clone();
    url.set_path(&join_paths(target.path(), incoming.path()));

    let query = match (
        target.query().filter(|q| !q.is_empty()),
        incoming.query().filter(|q| !q.is_empty()),
    ) {
        (Some(a), Some(b)) => Some(format!("{}&{}", a, b)),
        (Some(a), None) => Some(a.to_string()),
        (None, Some(b)) => Some(b.to_string()),
        (None, None) => None,
    };
    url.set_query(query.as_deref());
    url.set_fragment(None);

    url.as_str().parse()
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(target: &str, incoming: &str) -> String {
        let target = Url::parse(target).unwrap();
        let incoming: Uri = incoming.parse().unwrap();
        upstream_uri(&target, &incoming).unwrap().to_string()
    }

    #[test]
    fn joins_paths_and_queries() {
        assert_eq!(uri("http://backend:8080", "/a/b?x=1"), "http://backend:8080/a/b?x=1");
        assert_eq!(uri("http://backend/base/", "/a"), "http://backend/base/a");
        assert_eq!(uri("http://backend/base", "/a"), "http://backend/base/a");
        assert_eq!(uri("https://backend/?key=k", "/a?x=1"), "https://backend/a?key=k&x=1");
        assert_eq!(uri("http://backend/#frag", "/"), "http://backend/");
    }

    #[test]
    fn forwarded_for_appends_peer_not_claimed_client() {
        let peer: IpAddr = "192.0.2.7".parse().unwrap();

        let mut headers = HeaderMap::new();
        append_forwarded_for(&mut headers, peer);
        assert_eq!(headers[X_FORWARDED_FOR], "192.0.2.7");

        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("6.6.6.6"));
        append_forwarded_for(&mut headers, peer);
        assert_eq!(headers[X_FORWARDED_FOR], "6.6.6.6, 192.0.2.7");
    }

    #[test]
    fn client_builds_without_process_default_provider() {
        assert!(UpstreamClient::new().is_ok());
    }

    #[test]
    fn authority_omits_default_port() {
        assert_eq!(
            target_authority(&Url::parse("http://backend:80/").unwrap()).as_deref(),
            Some("backend")
        );
        assert_eq!(
            target_authority(&Url::parse("https://backend:8443/").unwrap()).as_deref(),
            Some("backend:8443")
        );
    }
}
