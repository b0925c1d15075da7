//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_sessions_total` (counter): finished sessions by `outcome`
//! - `relay_bytes_total` (counter): bytes handed to sinks
//! - `relay_session_duration_seconds` (histogram): session wall time
//! - `http_requests_total` (counter): responses by `status`

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::relay::{RelayError, RelayReport};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the end of a relay session.
pub fn record_session(result: &Result<RelayReport, RelayError>, started: Instant) {
    let (outcome, bytes) = match result {
        Ok(report) => ("completed", report.bytes_delivered),
        Err(e) => (e.kind(), e.bytes_delivered()),
    };

    ::metrics::counter!("relay_sessions_total", "outcome" => outcome).increment(1);
    ::metrics::counter!("relay_bytes_total").increment(bytes);
    ::metrics::histogram!("relay_session_duration_seconds")
        .record(started.elapsed().as_secs_f64());
}

/// Record a response status returned by the HTTP handler.
pub fn record_response(status: u16) {
    ::metrics::counter!("http_requests_total", "status" => status.to_string()).increment(1);
}
