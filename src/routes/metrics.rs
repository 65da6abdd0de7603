//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring.

use std::time::Duration;

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

use crate::proxy::Capability;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    let _ = &*PROMETHEUS_HANDLE;
    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!(
        "modelhub_proxy_requests_total",
        "Total number of proxy requests by capability and outcome"
    );
    metrics::describe_histogram!(
        "modelhub_proxy_request_duration_seconds",
        "Time from request receipt to response headers"
    );
    metrics::describe_counter!(
        "modelhub_proxy_upstream_responses_total",
        "Upstream responses by capability and status"
    );
    metrics::describe_counter!(
        "modelhub_proxy_streams_total",
        "Completed streaming relays"
    );
    metrics::describe_counter!(
        "modelhub_proxy_stream_chunks_total",
        "Chunks relayed on streaming responses"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record a finished proxy request
pub fn record_request(capability: Capability, outcome: &'static str, duration: Duration) {
    metrics::counter!(
        "modelhub_proxy_requests_total",
        "capability" => capability.label(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "modelhub_proxy_request_duration_seconds",
        "capability" => capability.label()
    )
    .record(duration.as_secs_f64());
}

pub fn record_upstream_status(capability: Capability, status: u16) {
    metrics::counter!(
        "modelhub_proxy_upstream_responses_total",
        "capability" => capability.label(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_stream(capability: Capability, chunks: usize) {
    metrics::counter!("modelhub_proxy_streams_total", "capability" => capability.label())
        .increment(1);
    metrics::counter!("modelhub_proxy_stream_chunks_total", "capability" => capability.label())
        .increment(chunks as u64);
}
