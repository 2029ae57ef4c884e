//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::SubfwdConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid {name}: '{value}'")]
    Env { name: &'static str, value: String },
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file into a configuration without validating it.
pub fn read_config(path: &Path) -> Result<SubfwdConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load configuration: file (if any), then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<SubfwdConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => SubfwdConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `PORT`, `HEROKU_API_KEY` and `HEROKU_APP_NAME` from the environment.
pub fn apply_env_overrides<F>(config: &mut SubfwdConfig, var: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = var("PORT").filter(|p| !p.is_empty()) {
        let parsed = port.parse::<u16>().map_err(|_| ConfigError::Env {
            name: "PORT",
            value: port.clone(),
        })?;
        config.listener.set_port(parsed);
    }

    if let Some(key) = var("HEROKU_API_KEY").filter(|k| !k.is_empty()) {
        config.registrar.api_key = Some(key);
    }

    if let Some(app) = var("HEROKU_APP_NAME").filter(|a| !a.is_empty()) {
        config.registrar.app_name = app;
    }

    Ok(())
}
