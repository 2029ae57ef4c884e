//! Per-request placeholder substitution in target URLs.
//!
//! Recognised tokens:
//! - `$IP`: client address (first `X-Forwarded-For` entry, else the peer IP)
//! - `$DATE`: request time in milliseconds since the Unix epoch
//! - `$HEADER[name]`: first value of request header `name`, or empty
//!
//! Substitution is a single left-to-right pass; inserted values are never
//! re-scanned.

use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::HeaderMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?:IP|DATE|HEADER\[([^\]]*)\])").expect("token pattern is valid")
});

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Values available to a substitution.
#[derive(Debug, Clone)]
pub struct SubstitutionContext {
    pub client_ip: String,
    pub request_time_millis: i64,
    pub headers: HeaderMap,
}

impl SubstitutionContext {
    /// Capture the context of a request at the current time.
    pub fn from_request(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let request_time_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();

        Self {
            client_ip: client_ip(headers, peer),
            request_time_millis,
            headers: headers.clone(),
        }
    }
}

/// The requester's IP: forwarded-for if present, else the connection address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}

/// Replace every recognised token in `url`.
pub fn substitute(url: &str, ctx: &SubstitutionContext) -> String {
    TOKEN_REGEX
        .replace_all(url, |caps: &Captures<'_>| match caps.get(1) {
            Some(name) => ctx
                .headers
                .get(name.as_str())
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string(),
            None if caps[0].ends_with("IP") => ctx.client_ip.clone(),
            None => ctx.request_time_millis.to_string(),
        })
        .into_owned()
}
