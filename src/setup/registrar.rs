//! Hosting platform domain registrar.
//!
//! # Responsibilities
//! - Check that the configured credentials are accepted
//! - Check whether `*.<domain>` is already attached to the app
//! - Attach `*.<domain>` to the app
//!
//! # Design Decisions
//! - Every call answers a plain bool; transport errors are logged and
//!   reported as `false`
//! - Each call carries the configured timeout so an unresponsive API never
//!   holds an admin request indefinitely

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};

use crate::config::RegistrarConfig;

/// Custom domain management on the hosting platform.
#[async_trait]
pub trait DomainRegistrar: Send + Sync + std::fmt::Debug {
    async fn valid_credentials(&self) -> bool;
    async fn has_domain(&self, domain: &str) -> bool;
    async fn add_domain(&self, domain: &str) -> bool;
}

/// Heroku Platform API v3 registrar.
#[derive(Debug, Clone)]
pub struct HerokuRegistrar {
    client: Client,
    api_base: String,
    app_name: String,
    /// `None` when no API key is configured; every call then fails.
    headers: Option<HeaderMap>,
}

impl HerokuRegistrar {
    pub fn new(config: &RegistrarConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let headers = config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .and_then(|key| HeaderValue::from_str(&format!("Bearer {}", key)).ok())
            .map(|bearer| {
                let mut headers = HeaderMap::new();
                headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.heroku+json; version=3"));
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                headers.insert(AUTHORIZATION, bearer);
                headers
            });

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            app_name: config.app_name.clone(),
            headers,
        })
    }

    /// Issue one API call; `None` on missing credentials or transport error.
    async fn request(&self, method: Method, path: &str, body: Option<serde_json::Value>) -> Option<StatusCode> {
        let headers = self.headers.as_ref()?;
        let url = format!("{}{}", self.api_base, path);

        let mut req = self.client.request(method.clone(), &url).headers(headers.clone());
        if let Some(body) = body {
            req = req.json(&body);
        }

        match req.send().await {
            Ok(res) => {
                let status = res.status();
                tracing::debug!(method = %method, path = %path, status = %status, "Registrar response");
                Some(status)
            }
            Err(e) => {
                tracing::warn!(method = %method, path = %path, error = %e, "Registrar request failed");
                None
            }
        }
    }
}

#[async_trait]
impl DomainRegistrar for HerokuRegistrar {
    async fn valid_credentials(&self) -> bool {
        self.request(Method::GET, "/account", None).await == Some(StatusCode::OK)
    }

    async fn has_domain(&self, domain: &str) -> bool {
        let path = format!("/apps/{}/domains/*.{}", self.app_name, domain);
        self.request(Method::GET, &path, None).await == Some(StatusCode::OK)
    }

    async fn add_domain(&self, domain: &str) -> bool {
        let path = format!("/apps/{}/domains", self.app_name);
        let body = serde_json::json!({ "hostname": format!("*.{}", domain) });
        self.request(Method::POST, &path, Some(body)).await == Some(StatusCode::CREATED)
    }
}
