//! DNS-driven subdomain forwarding.
//!
//! Visitors to `<sub>.<domain>` are redirected or reverse-proxied to a URL
//! published by the domain owner in a TXT record.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resolver;
pub mod routing;
pub mod setup;
pub mod store;
pub mod template;
pub mod tracking;

pub use config::schema::SubfwdConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
