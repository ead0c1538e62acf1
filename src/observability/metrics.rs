//! Metrics collection and exposition.
//!
//! # Metrics
//! - `drain_attempts_total` (counter): terminal attempts by chain, status
//! - `drain_runs_total` (counter): orchestration runs by outcome
//! - `protection_events_total` (counter): event log appends by kind
//! - `notification_messages_total` (counter): inbound notifications by type
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_drain_attempt(chain: &str, status: &'static str) {
    metrics::counter!("drain_attempts_total", "chain" => chain.to_string(), "status" => status)
        .increment(1);
}

pub fn record_run(outcome: &'static str) {
    metrics::counter!("drain_runs_total", "outcome" => outcome).increment(1);
}

pub fn record_protection_event(kind: &'static str) {
    metrics::counter!("protection_events_total", "kind" => kind).increment(1);
}

pub fn record_notification(kind: &'static str) {
    metrics::counter!("notification_messages_total", "kind" => kind).increment(1);
}
