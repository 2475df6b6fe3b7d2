//! Relay pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! request (with ?destination=<url>)
//!     → pipeline.rs (destination parse, gate, fetch orchestration)
//!     → headers.rs (outbound merge, inbound sanitization)
//!     → dispatch.rs (content-type branch, embed envelope)
//!     → response
//! ```

pub mod dispatch;
pub mod headers;
pub mod pipeline;

pub use dispatch::ContentDispatcher;
pub use pipeline::RelayPipeline;
