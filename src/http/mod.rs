//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, host dispatch)
//!     → request.rs (request ID, peer address)
//!     → forward.rs (resolve, substitute, redirect or proxy)
//!     → proxy.rs (upstream request, streamed response)
//!     → response.rs (redirects, short errors, header hygiene)
//!     → Send to client
//! ```

pub mod forward;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use request::RequestUuid;
pub use server::{AppState, HttpServer};
