//! Lifecycle management subsystem.
//!
//! # Design Decisions
//! - Ordered shutdown: stop accepting, drain in-flight requests, exit
//! - SIGTERM and SIGINT both trigger the same graceful path

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
