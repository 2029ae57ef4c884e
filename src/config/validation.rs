//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject aliases that would map a host to nothing
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SubfwdConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::SubfwdConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),
    #[error("hosts.{0} must not be empty")]
    EmptyHost(&'static str),
    #[error("hosts.debug_aliases entry '{0}' has an empty target")]
    EmptyAlias(String),
    #[error("registrar.timeout_secs must be greater than zero")]
    RegistrarTimeout,
    #[error("registrar.api_base '{0}' is not a valid URL")]
    RegistrarBase(String),
    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,
    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &SubfwdConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.hosts.admin_host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost("admin_host"));
    }
    if config.hosts.canonical_host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost("canonical_host"));
    }
    for (from, to) in &config.hosts.debug_aliases {
        if to.trim().is_empty() {
            errors.push(ValidationError::EmptyAlias(from.clone()));
        }
    }

    if config.registrar.timeout_secs == 0 {
        errors.push(ValidationError::RegistrarTimeout);
    }
    if url::Url::parse(&config.registrar.api_base).is_err() {
        errors.push(ValidationError::RegistrarBase(config.registrar.api_base.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&SubfwdConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = SubfwdConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.hosts.admin_host = " ".into();
        config.registrar.timeout_secs = 0;
        config.hosts.debug_aliases.insert("lvh.me".into(), "".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::EmptyHost("admin_host")));
        assert!(errors.contains(&ValidationError::RegistrarTimeout));
    }
}
