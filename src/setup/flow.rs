//! Domain provisioning.
//!
//! A domain is accepted once its wildcard CNAME is shown to point at this
//! service; it is then attached to the hosting platform app if it is not
//! already.
//!
//! ```text
//! domain
//!     → structural check (bare registrable domain)   → DOMAIN_ERROR
//!     → CNAME of <random hex>.<domain>                → NO_CNAME
//!     → target is canonical host / app domain         → WRONG_CNAME
//!     → registrar credentials                         → HEROKU_ERROR
//!     → has_domain, else add_domain                   → SET_DOMAIN_ERROR
//! ```

use std::sync::Arc;

use rand::RngCore;

use crate::resolver::dns::DnsLookup;
use crate::routing::host::HostParser;
use crate::setup::registrar::DomainRegistrar;

/// Bytes of randomness in the ownership probe label.
const PROBE_BYTES: usize = 16;

/// Why a setup was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("DOMAIN_ERROR")]
    Domain,
    #[error("NO_CNAME")]
    NoCname,
    #[error("WRONG_CNAME")]
    WrongCname { found: String },
    #[error("HEROKU_ERROR")]
    Registrar,
    #[error("SET_DOMAIN_ERROR")]
    SetDomain,
}

impl SetupError {
    /// Stable code surfaced to the admin caller.
    pub fn code(&self) -> &'static str {
        match self {
            SetupError::Domain => "DOMAIN_ERROR",
            SetupError::NoCname => "NO_CNAME",
            SetupError::WrongCname { .. } => "WRONG_CNAME",
            SetupError::Registrar => "HEROKU_ERROR",
            SetupError::SetDomain => "SET_DOMAIN_ERROR",
        }
    }
}

/// Validates and registers forwarding domains.
#[derive(Debug, Clone)]
pub struct SetupFlow {
    parser: HostParser,
    dns: Arc<dyn DnsLookup>,
    registrar: Arc<dyn DomainRegistrar>,
    canonical_host: String,
    app_domain_suffix: String,
}

impl SetupFlow {
    pub fn new(
        dns: Arc<dyn DnsLookup>,
        registrar: Arc<dyn DomainRegistrar>,
        canonical_host: &str,
        app_domain_suffix: &str,
    ) -> Self {
        Self {
            // Setup domains are taken literally; debug aliases never apply.
            parser: HostParser::default(),
            dns,
            registrar,
            canonical_host: canonical_host.trim_end_matches('.').to_ascii_lowercase(),
            app_domain_suffix: app_domain_suffix.to_ascii_lowercase(),
        }
    }

    /// Run the full provisioning flow for `domain`.
    pub async fn setup(&self, domain: &str) -> Result<(), SetupError> {
        let parsed = self.parser.parse(domain).map_err(|_| SetupError::Domain)?;
        if !parsed.is_bare() {
            return Err(SetupError::Domain);
        }
        let domain = parsed.registrable();

        let probe = format!("{}.{}", probe_label(), domain);
        let cname = self.dns.lookup_cname(&probe).await.map_err(|e| {
            tracing::info!(domain = %domain, probe = %probe, error = %e, "Ownership probe failed");
            SetupError::NoCname
        })?;

        let cname = cname.trim_end_matches('.').to_ascii_lowercase();
        if !self.is_own_host(&cname) {
            tracing::info!(domain = %domain, cname = %cname, "Ownership probe points elsewhere");
            return Err(SetupError::WrongCname { found: cname });
        }

        if !self.registrar.valid_credentials().await {
            tracing::warn!(domain = %domain, "Registrar credentials rejected");
            return Err(SetupError::Registrar);
        }

        if self.registrar.has_domain(&domain).await {
            tracing::info!(domain = %domain, "Domain already registered");
            return Ok(());
        }

        if !self.registrar.add_domain(&domain).await {
            tracing::warn!(domain = %domain, "Registrar refused domain");
            return Err(SetupError::SetDomain);
        }

        tracing::info!(domain = %domain, "Domain registered");
        Ok(())
    }

    /// Check registrar credentials once, logging the outcome.
    pub async fn registrar_ready(&self) -> bool {
        let ok = self.registrar.valid_credentials().await;
        if ok {
            tracing::info!("Registrar credentials accepted");
        } else {
            tracing::warn!("Registrar credentials rejected; domain setup will fail");
        }
        ok
    }

    fn is_own_host(&self, cname: &str) -> bool {
        cname == self.canonical_host
            || (!self.app_domain_suffix.is_empty() && cname.ends_with(&self.app_domain_suffix))
    }
}

/// A fresh, unguessable label for the wildcard probe.
fn probe_label() -> String {
    let mut bytes = [0u8; PROBE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
