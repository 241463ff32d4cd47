//! Metrics collection and exposition.
//!
//! # Metrics
//! - `upstream_requests_total` (counter): upstream calls by kind and outcome
//! - `upstream_retries_total` (counter): scheduled retries by kind
//! - `cache_lookups_total` (counter): lookups by kind and result (hit, miss, joined)
//! - `http_requests_total` (counter): served requests by status
//! - `http_request_duration_seconds` (histogram): request latency
//!
//! Recording is a no-op until a recorder is installed by `init_metrics`.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::upstream::ResourceKind;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_upstream_request(kind: ResourceKind, outcome: &'static str) {
    counter!("upstream_requests_total", "kind" => kind.as_str(), "outcome" => outcome).increment(1);
}

pub fn record_retry(kind: ResourceKind) {
    counter!("upstream_retries_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_cache_lookup(kind: ResourceKind, result: &'static str) {
    counter!("cache_lookups_total", "kind" => kind.as_str(), "result" => result).increment(1);
}

pub fn record_request(status: u16, start: Instant) {
    counter!("http_requests_total", "status" => status.to_string()).increment(1);
    histogram!("http_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
