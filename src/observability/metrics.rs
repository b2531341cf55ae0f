//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ssr_requests_total` (counter): requests by method, status and outcome
//! - `ssr_request_duration_seconds` (histogram): time to response head
//! - `ssr_render_duration_seconds` (histogram): time spent in the renderer
//! - `ssr_bridge_chunks_total` / `ssr_bridge_bytes_total` (counters): streamed body volume
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed (tests never install one)
//! - Prometheus exporter only starts when enabled in config

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished request.
///
/// `outcome` is `handled`, `unhandled` or `error`.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("outcome", outcome.to_string()),
    ];
    metrics::counter!("ssr_requests_total", &labels).increment(1);
    metrics::histogram!("ssr_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// Record time spent rendering.
pub fn record_render(status: u16, start: Instant) {
    metrics::histogram!("ssr_render_duration_seconds", "status" => status.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record a completed body delivery.
pub fn record_delivery(chunks: usize, bytes: usize) {
    metrics::counter!("ssr_bridge_chunks_total").increment(chunks as u64);
    metrics::counter!("ssr_bridge_bytes_total").increment(bytes as u64);
}
