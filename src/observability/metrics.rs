//! Metrics collection and exposition.
//!
//! # Metrics
//! - `streamer_requests_denied_total` (counter): denials by pipeline stage
//! - `streamer_tail_sessions_active` (gauge): open tail sessions
//! - `streamer_tail_lines_total` (counter): lines delivered to clients
//! - `streamer_tail_truncations_total` (counter): truncation resets observed
//! - `streamer_lifecycle_events_total` (counter): stop/restart/signal events
//!
//! Recording is a no-op until a recorder is installed, so unit tests need no setup.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_denied(stage: &'static str) {
    counter!("streamer_requests_denied_total", "stage" => stage).increment(1);
}

pub fn tail_session_opened() {
    gauge!("streamer_tail_sessions_active").increment(1.0);
}

pub fn tail_session_closed() {
    gauge!("streamer_tail_sessions_active").decrement(1.0);
}

pub fn record_lines(count: usize) {
    counter!("streamer_tail_lines_total").increment(count as u64);
}

pub fn record_truncation() {
    counter!("streamer_tail_truncations_total").increment(1);
}

pub fn record_lifecycle(event: &'static str) {
    counter!("streamer_lifecycle_events_total", "event" => event).increment(1);
}
