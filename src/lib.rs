//! Edge relay library.
//!
//! A server-side relay that fetches arbitrary destination URLs on behalf of
//! its callers: destination resolution → access gate → header sanitization
//! → upstream fetch → content-type dispatch → response assembly.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod relay;

// Access control
pub mod security;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::RelayConfig;
pub use error::RelayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::RelayPipeline;
