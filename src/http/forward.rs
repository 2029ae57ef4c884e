//! Forwarding dispatch for every non-admin host.
//!
//! ```text
//! Host header
//!     → HostParser (500 on malformed host)
//!     → TargetResolver (three joined TXT lookups, 404 on miss)
//!     → template substitution (400 if the result is not an http(s) URL)
//!     → Proxy tier: reverse proxy (502 on upstream failure)
//!       otherwise:  302 redirect
//! ```

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use url::Url;

use crate::http::request::{peer_addr, referer};
use crate::http::response::{redirect, text};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resolver::ResolutionTier;
use crate::routing::matcher::request_host;
use crate::template::{substitute, SubstitutionContext};
use crate::tracking::{Action, TrackEvent};

/// Dispatch one forwarding request.
pub async fn forward(state: &AppState, request: Request<Body>) -> Response {
    let host_header = request_host(&request).unwrap_or_default().to_string();

    let host = match state.hosts.parse(&host_header) {
        Ok(host) => host,
        Err(e) => {
            tracing::warn!(host = %host_header, error = %e, "Unparseable host");
            metrics::record_dispatch("bad_host");
            return text(StatusCode::INTERNAL_SERVER_ERROR, "Invalid host\n");
        }
    };

    let peer = peer_addr(&request);
    let ctx = SubstitutionContext::from_request(request.headers(), peer);

    let started = Instant::now();
    let resolved = state.resolver.resolve(&host).await;
    metrics::record_resolution(started);

    let Some(target) = resolved else {
        let seq = state.stats.record_failure();
        tracing::info!(
            seq,
            action = %Action::Miss,
            subdomain = %host.subdomain,
            host = %host.registrable(),
            ip = %ctx.client_ip,
            "No target configured"
        );
        metrics::record_dispatch("miss");
        state.tracker.track(TrackEvent {
            action: Action::Miss,
            host: host.to_string(),
            domain: host.registrable(),
            destination: None,
            client_ip: ctx.client_ip.clone(),
        });
        return text(StatusCode::NOT_FOUND, "No target configured\n");
    };

    let destination = substitute(&target.raw_url, &ctx);
    let url = match parse_target(&destination) {
        Some(url) => url,
        None => {
            tracing::warn!(host = %host, tier = %target.tier, destination = %destination, "Invalid target URL");
            metrics::record_dispatch("bad_target");
            return text(StatusCode::BAD_REQUEST, "Invalid target URL\n");
        }
    };

    let referer = referer(request.headers()).to_string();
    let (action, response) = match target.tier {
        ResolutionTier::Proxy => match state.client.proxy(&url, request, peer.map(|a| a.ip())).await {
            Ok(response) => (Action::Proxy, response),
            Err(e) => {
                tracing::error!(host = %host, destination = %url, error = %e, "Upstream request failed");
                metrics::record_dispatch("upstream_error");
                return text(StatusCode::BAD_GATEWAY, "Upstream request failed\n");
            }
        },
        ResolutionTier::Forward | ResolutionTier::Default => (Action::Redirect, redirect(url.as_str())),
    };

    let seq = state.stats.record_forward();
    tracing::info!(
        seq,
        action = %action,
        subdomain = %host.subdomain,
        host = %host.registrable(),
        destination = %url,
        ip = %ctx.client_ip,
        referer = %referer,
        "Forwarded"
    );
    metrics::record_dispatch(match action {
        Action::Proxy => "proxy",
        _ => "redirect",
    });
    state.tracker.track(TrackEvent {
        action,
        host: host.to_string(),
        domain: host.registrable(),
        destination: Some(url.to_string()),
        client_ip: ctx.client_ip,
    });

    response
}

/// An absolute http(s) URL with a host, or nothing.
fn parse_target(destination: &str) -> Option<Url> {
    let url = Url::parse(destination).ok()?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Some(url),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_http_targets_with_host() {
        assert!(parse_target("https://example.org/a?b=1").is_some());
        assert!(parse_target("http://10.0.0.1:8080").is_some());
        assert!(parse_target("httpfoo").is_none());
        assert!(parse_target("http//missing-colon").is_none());
        assert!(parse_target("ftp://example.org").is_none());
    }
}
