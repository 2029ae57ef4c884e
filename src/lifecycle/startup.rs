//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the DNS lookup selected by configuration
//! - Build the registrar, store and tracker
//! - Assemble the shared [`AppState`]
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::sync::Arc;

use crate::config::{DnsConfig, DnsMode, SubfwdConfig};
use crate::http::server::AppState;
use crate::resolver::dns::{DnsError, DnsLookup, StaticZone, SystemResolver};
use crate::setup::registrar::HerokuRegistrar;
use crate::store::MemoryStore;

/// Why the service could not start.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("DNS resolver: {0}")]
    Dns(#[from] DnsError),
    #[error("registrar client: {0}")]
    Registrar(#[from] reqwest::Error),
    #[error("upstream TLS: {0}")]
    Tls(#[from] rustls::Error),
}

/// The DNS lookup named by `config.mode`.
pub fn build_dns(config: &DnsConfig) -> Result<Arc<dyn DnsLookup>, StartupError> {
    match config.mode {
        DnsMode::System => Ok(Arc::new(SystemResolver::from_system_conf()?)),
        DnsMode::Static => {
            tracing::info!(
                txt = config.txt.len(),
                cname = config.cname.len(),
                "Using static DNS zone"
            );
            Ok(Arc::new(StaticZone::from_tables(&config.txt, &config.cname)))
        }
    }
}

/// Build every collaborator in dependency order. Must run inside a Tokio runtime.
pub fn build_state(config: &SubfwdConfig) -> Result<AppState, StartupError> {
    let dns = build_dns(&config.dns)?;
    let registrar = Arc::new(HerokuRegistrar::new(&config.registrar)?);
    let store = Arc::new(MemoryStore::new());

    tracing::debug!(
        admin_host = %config.hosts.admin_host,
        app = %config.registrar.app_name,
        "Collaborators initialized"
    );

    AppState::new(config, dns, registrar, store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_mode_serves_configured_records() {
        let mut config = DnsConfig {
            mode: DnsMode::Static,
            ..Default::default()
        };
        config
            .txt
            .insert("subfwd-www.example.com".into(), vec!["http://example.org".into()]);

        let dns = build_dns(&config).unwrap();
        assert_eq!(
            dns.lookup_txt("subfwd-www.example.com").await.unwrap(),
            vec!["http://example.org".to_string()]
        );
    }

    #[tokio::test]
    async fn builds_state_from_defaults() {
        let mut config = SubfwdConfig::default();
        config.dns.mode = DnsMode::Static;
        assert!(build_state(&config).is_ok());
    }
}
