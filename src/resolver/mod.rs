//! Target resolution subsystem.
//!
//! # Data Flow
//! ```text
//! ParsedHost
//!     → tier.rs (three record names: subproxy-, subfwd-, subfwd-default)
//!     → dns.rs (concurrent TXT lookups, joined)
//!     → tier.rs (first `http` value per tier, priority selection)
//!     → Option<ResolvedTarget>
//! ```

pub mod dns;
pub mod tier;

pub use dns::{DnsError, DnsLookup, StaticZone, SystemResolver};
pub use tier::{ResolutionTier, ResolvedTarget, TargetResolver, TierResults};
