//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration for subfwd.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SubfwdConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Host identities and debug aliases.
    pub hosts: HostsConfig,

    /// DNS lookup backend.
    pub dns: DnsConfig,

    /// Hosting platform domain registrar.
    pub registrar: RegistrarConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Admin surface settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Analytics event tracking.
    pub tracking: TrackingConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

impl ListenerConfig {
    /// Replace the port of the bind address, keeping the interface.
    pub fn set_port(&mut self, port: u16) {
        let host = self
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        self.bind_address = format!("{}:{}", host, port);
    }
}

/// Host identities used to classify and validate requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HostsConfig {
    /// Requests with this Host header are served by the admin surface.
    pub admin_host: String,

    /// The service's own hostname; wildcard CNAMEs may point here.
    pub canonical_host: String,

    /// Hosting platform app domain; wildcard CNAMEs may also end with this.
    pub app_domain_suffix: String,

    /// Local host suffix → production domain, applied before parsing.
    pub debug_aliases: HashMap<String, String>,
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            admin_host: "subfwd.com".to_string(),
            canonical_host: "subfwd.com".to_string(),
            app_domain_suffix: ".herokuapp.com".to_string(),
            debug_aliases: HashMap::new(),
        }
    }
}

/// Where DNS answers come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsMode {
    /// The platform resolver (system configuration).
    #[default]
    System,
    /// Fixed tables from this file.
    Static,
}

/// DNS lookup configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DnsConfig {
    pub mode: DnsMode,

    /// Record name → TXT values, in answer order (static mode).
    pub txt: HashMap<String, Vec<String>>,

    /// Record name → CNAME target; keys may start with `*.` (static mode).
    pub cname: HashMap<String, String>,
}

/// Domain registrar (Heroku Platform API) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistrarConfig {
    /// API base URL.
    pub api_base: String,

    /// API key; without one every registrar call reports failure.
    pub api_key: Option<String>,

    /// App that owns the custom domains.
    pub app_name: String,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.heroku.com".to_string(),
            api_key: None,
            app_name: "subfwd".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (until response headers) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Admin surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Directory holding the admin UI (index.html and assets).
    pub static_dir: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            static_dir: "static".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter when RUST_LOG is unset.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "subfwd=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Analytics tracking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub enabled: bool,

    /// Google Analytics property; events are only posted when set.
    pub tracking_id: Option<String>,

    /// Measurement protocol endpoint.
    pub endpoint: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tracking_id: None,
            endpoint: "https://www.google-analytics.com/collect".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: SubfwdConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert_eq!(config.hosts.admin_host, "subfwd.com");
        assert_eq!(config.dns.mode, DnsMode::System);
        assert_eq!(config.registrar.timeout_secs, 10);
    }

    #[test]
    fn static_zone_tables_parse() {
        let config: SubfwdConfig = toml::from_str(
            r#"
            [dns]
            mode = "static"

            [dns.txt]
            "subfwd-www.example.com" = ["v=spf1 -all", "http://example.org"]

            [dns.cname]
            "*.example.com" = "subfwd.com."
            "#,
        )
        .unwrap();
        assert_eq!(config.dns.mode, DnsMode::Static);
        assert_eq!(config.dns.txt["subfwd-www.example.com"].len(), 2);
        assert_eq!(config.dns.cname["*.example.com"], "subfwd.com.");
    }

    #[test]
    fn set_port_keeps_interface() {
        let mut listener = ListenerConfig {
            bind_address: "127.0.0.1:3000".into(),
        };
        listener.set_port(8080);
        assert_eq!(listener.bind_address, "127.0.0.1:8080");
    }
}
