//! DNS lookup backends.
//!
//! The resolver only needs two questions answered: the TXT strings on a name
//! and the CNAME target of a name. [`DnsLookup`] is that seam;
//! [`SystemResolver`] answers through the platform resolver and
//! [`StaticZone`] answers from fixed tables.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::TokioAsyncResolver;

/// Error type for DNS lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DnsError {
    /// The name exists but has no record of the requested type, or does not exist.
    #[error("no {record} record for {name}")]
    NoRecords { name: String, record: &'static str },
    /// The lookup itself failed.
    #[error("lookup of {name} failed: {reason}")]
    Lookup { name: String, reason: String },
}

/// Answers the DNS questions the service asks.
#[async_trait]
pub trait DnsLookup: Send + Sync + Debug {
    /// All TXT values on `name`, in the order the resolver returned them.
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError>;

    /// The CNAME target of `name`, as returned (trailing dot included if present).
    async fn lookup_cname(&self, name: &str) -> Result<String, DnsError>;
}

/// Lookups through the platform resolver configuration.
#[derive(Debug, Clone)]
pub struct SystemResolver {
    inner: TokioAsyncResolver,
}

impl SystemResolver {
    /// Build from the system configuration (`/etc/resolv.conf` on Unix).
    pub fn from_system_conf() -> Result<Self, DnsError> {
        let inner = TokioAsyncResolver::tokio_from_system_conf().map_err(|e| DnsError::Lookup {
            name: "system configuration".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl DnsLookup for SystemResolver {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        let lookup = self.inner.txt_lookup(name).await.map_err(|e| DnsError::Lookup {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        // A TXT record may carry several character-strings; they form one value.
        Ok(lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|data| String::from_utf8_lossy(data))
                    .collect::<String>()
            })
            .collect())
    }

    async fn lookup_cname(&self, name: &str) -> Result<String, DnsError> {
        let lookup = self
            .inner
            .lookup(name, RecordType::CNAME)
            .await
            .map_err(|e| DnsError::Lookup {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        lookup
            .iter()
            .find_map(|rdata| rdata.as_cname().map(|cname| cname.0.to_string()))
            .ok_or_else(|| DnsError::NoRecords {
                name: name.to_string(),
                record: "CNAME",
            })
    }
}

/// Fixed answers, for offline development and tests.
///
/// CNAME keys of the form `*.example.com` answer for any name below
/// `example.com` that has no exact entry.
#[derive(Debug, Clone, Default)]
pub struct StaticZone {
    txt: HashMap<String, Vec<String>>,
    cname: HashMap<String, String>,
}

impl StaticZone {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration tables.
    pub fn from_tables(txt: &HashMap<String, Vec<String>>, cname: &HashMap<String, String>) -> Self {
        let mut zone = Self::new();
        for (name, values) in txt {
            for value in values {
                zone.add_txt(name, value);
            }
        }
        for (name, target) in cname {
            zone.add_cname(name, target);
        }
        zone
    }

    /// Append a TXT value to `name`.
    pub fn add_txt(&mut self, name: &str, value: &str) -> &mut Self {
        self.txt
            .entry(normalize(name))
            .or_default()
            .push(value.to_string());
        self
    }

    /// Set the CNAME target of `name` (which may be a `*.` wildcard).
    pub fn add_cname(&mut self, name: &str, target: &str) -> &mut Self {
        self.cname.insert(normalize(name), target.to_string());
        self
    }
}

#[async_trait]
impl DnsLookup for StaticZone {
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        self.txt
            .get(&normalize(name))
            .cloned()
            .ok_or_else(|| DnsError::NoRecords {
                name: name.to_string(),
                record: "TXT",
            })
    }

    async fn lookup_cname(&self, name: &str) -> Result<String, DnsError> {
        let name = normalize(name);
        if let Some(target) = self.cname.get(&name) {
            return Ok(target.clone());
        }

        // Walk up the tree looking for the closest wildcard.
        let mut rest = name.as_str();
        while let Some((_, parent)) = rest.split_once('.') {
            if let Some(target) = self.cname.get(&format!("*.{}", parent)) {
                return Ok(target.clone());
            }
            rest = parent;
        }

        Err(DnsError::NoRecords {
            name,
            record: "CNAME",
        })
    }
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}
