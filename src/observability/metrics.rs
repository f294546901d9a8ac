//! # Metrics Collection
//!
//! Prometheus metrics for RPC calls and secret store calls.
//!
//! Recording is a no-op until [`init_metrics`] has installed the exporter.

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};

/// Metrics recorder that tracks application metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Record one RPC call and its outcome (`ok` or an error kind)
    pub fn record_rpc(&self, method: &str, status: &str, duration: f64) {
        let labels = [("method", method.to_string()), ("status", status.to_string())];
        counter!("keytree_rpc_requests_total", &labels).increment(1);

        let duration_labels = [("method", method.to_string())];
        histogram!("keytree_rpc_duration_seconds", &duration_labels).record(duration);
    }

    /// Record one secret store call
    pub fn record_store_call(&self, operation: &str, success: bool, duration: f64) {
        let status = if success { "success" } else { "error" };
        let labels = [("operation", operation.to_string()), ("status", status.to_string())];
        counter!("keytree_store_calls_total", &labels).increment(1);

        let duration_labels = [("operation", operation.to_string())];
        histogram!("keytree_store_call_duration_seconds", &duration_labels).record(duration);
    }

    pub fn register_metrics(&self) {
        describe_counter!(
            "keytree_rpc_requests_total",
            Unit::Count,
            "RPC calls handled, by method and status"
        );
        describe_histogram!(
            "keytree_rpc_duration_seconds",
            Unit::Seconds,
            "RPC call latency, by method"
        );
        describe_counter!(
            "keytree_store_calls_total",
            Unit::Count,
            "Secret store list/read calls, by operation and status"
        );
        describe_histogram!(
            "keytree_store_call_duration_seconds",
            Unit::Seconds,
            "Secret store call latency, by operation"
        );
    }
}

static METRICS: OnceCell<MetricsRecorder> = OnceCell::new();

/// Initialize metrics collection and the Prometheus exporter
pub fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    if !config.enable_metrics {
        return Ok(());
    }

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("Metrics disabled: no bind address configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        Error::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name)
        .install()
        .map_err(|e| Error::config(format!("Failed to initialize metrics exporter: {}", e)))?;

    let recorder = METRICS.get_or_init(MetricsRecorder::new);
    recorder.register_metrics();

    info!(metrics_addr = %metrics_addr, "Prometheus metrics exporter started");

    Ok(())
}

/// The global recorder, if metrics are enabled
pub fn get_metrics() -> Option<&'static MetricsRecorder> {
    METRICS.get()
}

/// Record an RPC call using the global recorder
pub fn record_rpc(method: &str, status: &str, duration: f64) {
    if let Some(metrics) = get_metrics() {
        metrics.record_rpc(method, status, duration);
    }
}

/// Record a secret store call using the global recorder
pub fn record_store_call(operation: &str, success: bool, duration: f64) {
    if let Some(metrics) = get_metrics() {
        metrics.record_store_call(operation, success, duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_rpc("GetFullTree", "ok", 0.01);
        record_store_call("list", false, 0.002);
    }

    #[test]
    fn test_recorder_methods() {
        let recorder = MetricsRecorder::new();
        recorder.register_metrics();
        recorder.record_rpc("Validate", "not_found", 0.003);
        recorder.record_store_call("read", true, 0.001);
    }

    #[test]
    fn test_init_metrics_disabled() {
        let config = ObservabilityConfig { enable_metrics: false, ..Default::default() };
        assert!(init_metrics(&config).is_ok());
        assert!(get_metrics().is_none());
    }

    #[test]
    fn test_init_metrics_no_port() {
        let config =
            ObservabilityConfig { enable_metrics: true, metrics_port: 0, ..Default::default() };
        assert!(init_metrics(&config).is_ok());
    }
}
