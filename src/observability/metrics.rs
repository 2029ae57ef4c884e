//! Metrics collection and exposition.
//!
//! # Metrics
//! - `subfwd_requests_total` (counter): dispatch outcomes by action
//!   (redirect, proxy, miss, bad_host, bad_target, upstream_error)
//! - `subfwd_resolve_duration_seconds` (histogram): time spent on the three
//!   joined TXT lookups
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics exporter"),
    }
}

/// Count one dispatch outcome.
pub fn record_dispatch(action: &'static str) {
    metrics::counter!("subfwd_requests_total", "action" => action).increment(1);
}

/// Record how long tier resolution took.
pub fn record_resolution(start: Instant) {
    metrics::histogram!("subfwd_resolve_duration_seconds").record(start.elapsed().as_secs_f64());
}
