//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by method, status, mode
//! - `relay_request_duration_seconds` (histogram): latency distribution
//! - `relay_gate_denied_total` (counter): gate denials
//! - `relay_upstream_errors_total` (counter): failed upstream fetches

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    if let Err(e) = builder.install() {
        tracing::error!(error = %e, "Failed to install metrics exporter");
    } else {
        tracing::info!(address = %addr, "Metrics exporter listening");
    }
}

/// Record a completed relay request.
pub fn record_request(method: &str, status: u16, mode: &str, started: Instant) {
    metrics::counter!(
        "relay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "mode" => mode.to_string()
    )
    .increment(1);
    metrics::histogram!("relay_request_duration_seconds")
        .record(started.elapsed().as_secs_f64());
}

/// Record a gate denial.
pub fn record_gate_denied() {
    metrics::counter!("relay_gate_denied_total").increment(1);
}

/// Record a failed upstream fetch.
pub fn record_upstream_error() {
    metrics::counter!("relay_upstream_errors_total").increment(1);
}
