//! Forwarding tiers and target resolution.
//!
//! # Responsibilities
//! - Map each tier to its TXT record name
//! - Pick the first `http`-prefixed value from a lookup
//! - Resolve all tiers of a request concurrently and select by priority
//!
//! # Design Decisions
//! - Lookup failure and "no record" are the same outcome here: the tier is
//!   empty and selection falls through
//! - All three lookups always complete before selection; the winner depends
//!   only on which tiers resolved, never on which finished first
//! - No cancellation of slower lookups once a higher tier is known

use std::fmt;
use std::sync::Arc;

use crate::resolver::dns::DnsLookup;
use crate::routing::host::ParsedHost;

/// Only TXT values starting with this qualify as targets.
pub const TARGET_PREFIX: &str = "http";

/// A TXT lookup pattern consulted for every forwarding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionTier {
    /// `subfwd-<subdomain>.<domain>`: redirect.
    Forward,
    /// `subproxy-<subdomain>.<domain>`: reverse proxy.
    Proxy,
    /// `subfwd-default.<domain>`: redirect fallback.
    Default,
}

impl ResolutionTier {
    /// Tiers from highest to lowest priority.
    pub const PRIORITY: [ResolutionTier; 3] = [
        ResolutionTier::Proxy,
        ResolutionTier::Forward,
        ResolutionTier::Default,
    ];

    /// The TXT record name this tier consults for `host`. A bare domain has
    /// no subdomain label, so only the default tier applies to it.
    pub fn record_name(&self, host: &ParsedHost) -> Option<String> {
        match self {
            ResolutionTier::Default => Some(format!("subfwd-default.{}", host.registrable())),
            _ if host.is_bare() => None,
            ResolutionTier::Forward => Some(format!("subfwd-{}.{}", host.subdomain, host.registrable())),
            ResolutionTier::Proxy => Some(format!("subproxy-{}.{}", host.subdomain, host.registrable())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionTier::Forward => "forward",
            ResolutionTier::Proxy => "proxy",
            ResolutionTier::Default => "default",
        }
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A qualifying TXT value found for one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub tier: ResolutionTier,
    pub raw_url: String,
}

/// Results of all three tiers for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierResults {
    pub proxy: Option<ResolvedTarget>,
    pub forward: Option<ResolvedTarget>,
    pub default: Option<ResolvedTarget>,
}

impl TierResults {
    /// The highest-priority resolved tier; lower tiers are discarded.
    pub fn select(self) -> Option<ResolvedTarget> {
        self.proxy.or(self.forward).or(self.default)
    }
}

/// First value with the target prefix, in resolver order.
pub fn first_target(records: &[String]) -> Option<&str> {
    records
        .iter()
        .map(String::as_str)
        .find(|value| value.starts_with(TARGET_PREFIX))
}

/// Resolves forwarding targets from TXT records.
#[derive(Debug, Clone)]
pub struct TargetResolver {
    dns: Arc<dyn DnsLookup>,
}

impl TargetResolver {
    pub fn new(dns: Arc<dyn DnsLookup>) -> Self {
        Self { dns }
    }

    /// Look up one tier. Never fails: a miss and a DNS error both yield `None`.
    pub async fn resolve_tier(&self, tier: ResolutionTier, host: &ParsedHost) -> Option<ResolvedTarget> {
        let name = tier.record_name(host)?;
        match self.dns.lookup_txt(&name).await {
            Ok(records) => {
                let target = first_target(&records).map(|url| ResolvedTarget {
                    tier,
                    raw_url: url.to_string(),
                });
                tracing::debug!(
                    record = %name,
                    tier = %tier,
                    records = records.len(),
                    matched = target.is_some(),
                    "TXT lookup complete"
                );
                target
            }
            Err(e) => {
                tracing::debug!(record = %name, tier = %tier, error = %e, "TXT lookup failed");
                None
            }
        }
    }

    /// Look up every tier concurrently and wait for all of them.
    pub async fn resolve_all(&self, host: &ParsedHost) -> TierResults {
        let (forward, proxy, default) = tokio::join!(
            self.resolve_tier(ResolutionTier::Forward, host),
            self.resolve_tier(ResolutionTier::Proxy, host),
            self.resolve_tier(ResolutionTier::Default, host),
        );
        TierResults {
            proxy,
            forward,
            default,
        }
    }

    /// Resolve all tiers and select the winner by priority.
    pub async fn resolve(&self, host: &ParsedHost) -> Option<ResolvedTarget> {
        self.resolve_all(host).await.select()
    }
}
