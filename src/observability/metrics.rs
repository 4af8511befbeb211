//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ssl_guard_decisions_total` (counter): guard outcomes by decision and required protocol
//! - `ssl_helper_registry_rebuilds_total` (counter): published variant registries
//! - `ssl_helper_registry_helpers` (gauge): base builders covered by the current registry

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::policy::Protocol;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_guard_decision(decision: &'static str, required: Protocol) {
    metrics::counter!(
        "ssl_guard_decisions_total",
        "decision" => decision,
        "required" => required.scheme()
    )
    .increment(1);
}

pub fn record_registry_rebuild(helpers: usize) {
    metrics::counter!("ssl_helper_registry_rebuilds_total").increment(1);
    metrics::gauge!("ssl_helper_registry_helpers").set(helpers as f64);
}
