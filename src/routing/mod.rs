//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → router.rs (classify: Favicon / Admin / Forward)
//!     → matcher.rs (evaluate match conditions)
//!
//! Forward branch:
//!     Host header
//!     → host.rs (strip port, debug aliases, public suffix split)
//!     → ParsedHost handed to the resolver
//! ```
//!
//! # Design Decisions
//! - Classification compiled at startup, immutable at runtime
//! - Deterministic: same input always classifies the same way

pub mod host;
pub mod matcher;
pub mod router;

pub use host::{HostError, HostParser, ParsedHost};
pub use router::{Route, Router};
