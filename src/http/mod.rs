//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → cors.rs (preflight answered before the pipeline)
//!     → request.rs (request ID stamped)
//!     → server.rs (Axum setup, relay handler)
//!     → relay pipeline
//!     → response to client
//! ```

pub mod cors;
pub mod request;
pub mod server;

pub use request::{RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::HttpServer;
