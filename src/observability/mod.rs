//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging with the request ID on every pipeline event
//! - Metrics are cheap (atomic increments behind the metrics facade)
//! - The Prometheus endpoint is optional and lives on its own address

pub mod logging;
pub mod metrics;
