//! Forwarding domain provisioning.
//!
//! # Data Flow
//! ```text
//! GET /setup?domain=X (admin host)
//!     → flow.rs (shape check, wildcard CNAME probe)
//!     → registrar.rs (hosting platform API)
//!     → Ok / SetupError code
//! ```

pub mod flow;
pub mod registrar;

pub use flow::{SetupError, SetupFlow};
pub use registrar::{DomainRegistrar, HerokuRegistrar};
