//! Host header decomposition.
//!
//! # Responsibilities
//! - Strip the port from a Host header
//! - Rewrite debug hosts to their production-equivalent domain
//! - Split into subdomain / registrable domain / TLD using the public suffix list
//!
//! # Design Decisions
//! - Aliases are matched on whole-label suffixes, longest first, so
//!   `foo.lvh.me` maps through an `lvh.me` alias
//! - IP literals and empty labels are rejected rather than guessed at

use std::collections::HashMap;
use std::net::IpAddr;

/// A request host split into its structural parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHost {
    /// Everything left of the registrable domain; empty for a bare domain.
    pub subdomain: String,
    /// The registrable label, without the public suffix.
    pub domain: String,
    /// The public suffix (e.g. `com`, `co.uk`).
    pub tld: String,
}

impl ParsedHost {
    /// The registrable domain, `<domain>.<tld>`.
    pub fn registrable(&self) -> String {
        format!("{}.{}", self.domain, self.tld)
    }

    /// True when the host has no subdomain component.
    pub fn is_bare(&self) -> bool {
        self.subdomain.is_empty()
    }
}

impl std::fmt::Display for ParsedHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.subdomain.is_empty() {
            write!(f, "{}.{}", self.domain, self.tld)
        } else {
            write!(f, "{}.{}.{}", self.subdomain, self.domain, self.tld)
        }
    }
}

/// The host could not be decomposed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("URL_ERROR")]
pub struct HostError {
    pub host: String,
}

impl HostError {
    fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// Stable code surfaced at the HTTP boundary.
    pub fn code(&self) -> &'static str {
        "URL_ERROR"
    }
}

/// Remove a trailing `:<port>` if present.
pub fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port))
            if !name.contains(':') && !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) =>
        {
            name
        }
        _ => host,
    }
}

/// Parses Host headers, consulting a fixed alias table first.
#[derive(Debug, Clone, Default)]
pub struct HostParser {
    /// (from, to), longest `from` first.
    aliases: Vec<(String, String)>,
}

impl HostParser {
    /// Build a parser from an alias table (local host suffix → domain).
    pub fn new(aliases: &HashMap<String, String>) -> Self {
        let mut aliases: Vec<(String, String)> = aliases
            .iter()
            .map(|(from, to)| (normalize(from), normalize(to)))
            .collect();
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self { aliases }
    }

    /// Split a Host header into subdomain, domain and TLD.
    pub fn parse(&self, host_header: &str) -> Result<ParsedHost, HostError> {
        let host = normalize(host_header);
        if !is_hostname(&host) {
            return Err(HostError::new(host_header));
        }

        let host = self.apply_alias(&host);
        if host.parse::<IpAddr>().is_ok() {
            return Err(HostError::new(host_header));
        }

        let registrable = psl::domain_str(&host).ok_or_else(|| HostError::new(host_header))?;
        let tld = psl::suffix_str(registrable).ok_or_else(|| HostError::new(host_header))?;

        let domain = registrable
            .strip_suffix(tld)
            .and_then(|d| d.strip_suffix('.'))
            .filter(|d| !d.is_empty())
            .ok_or_else(|| HostError::new(host_header))?;

        let subdomain = if host.len() == registrable.len() {
            ""
        } else {
            host.strip_suffix(registrable)
                .and_then(|s| s.strip_suffix('.'))
                .ok_or_else(|| HostError::new(host_header))?
        };

        Ok(ParsedHost {
            subdomain: subdomain.to_string(),
            domain: domain.to_string(),
            tld: tld.to_string(),
        })
    }

    fn apply_alias(&self, host: &str) -> String {
        for (from, to) in &self.aliases {
            if host == from {
                tracing::trace!(host = %host, alias = %to, "Debug host aliased");
                return to.clone();
            }
            if let Some(prefix) = host.strip_suffix(from.as_str()).and_then(|p| p.strip_suffix('.')) {
                tracing::trace!(host = %host, alias = %to, "Debug host aliased");
                return format!("{}.{}", prefix, to);
            }
        }
        host.to_string()
    }
}

fn normalize(host: &str) -> String {
    strip_port(host.trim()).trim_end_matches('.').to_ascii_lowercase()
}

fn is_hostname(host: &str) -> bool {
    !host.is_empty()
        && host.split('.').all(|label| !label.is_empty())
        && host
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.')
}
