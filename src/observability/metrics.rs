//! Metrics collection and exposition.
//!
//! # Metrics
//! - `steer_requests_total` (counter): proxied requests by backend, status
//! - `steer_request_duration_seconds` (histogram): end-to-end proxy latency
//! - `steer_selections_total` (counter): pool selections by backend, strategy
//! - `steer_backend_active_connections` (gauge): in-flight per backend
//! - `steer_backend_healthy` (gauge): 1=healthy, 0=unhealthy
//! - `steer_health_probe_duration_seconds` (histogram): probe latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one proxied request outcome.
pub fn record_request(backend: &str, status: u16, start: Instant) {
    counter!(
        "steer_requests_total",
        "backend" => backend.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    histogram!(
        "steer_request_duration_seconds",
        "backend" => backend.to_string(),
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record one pool selection and the resulting in-flight count.
pub fn record_selection(backend: &str, strategy: &str, active_connections: usize) {
    counter!(
        "steer_selections_total",
        "backend" => backend.to_string(),
        "strategy" => strategy.to_string(),
    )
    .increment(1);
    gauge!(
        "steer_backend_active_connections",
        "backend" => backend.to_string(),
    )
    .set(active_connections as f64);
}

/// Record a request release and the resulting in-flight count.
pub fn record_release(backend: &str, active_connections: usize) {
    gauge!(
        "steer_backend_active_connections",
        "backend" => backend.to_string(),
    )
    .set(active_connections as f64);
}

/// Record a health probe outcome.
pub fn record_backend_health(backend: &str, healthy: bool, probe_start: Instant) {
    gauge!(
        "steer_backend_healthy",
        "backend" => backend.to_string(),
    )
    .set(if healthy { 1.0 } else { 0.0 });
    histogram!(
        "steer_health_probe_duration_seconds",
        "backend" => backend.to_string(),
    )
    .record(probe_start.elapsed().as_secs_f64());
}
