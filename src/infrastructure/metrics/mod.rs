//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - AI component errors by kind, code and route template
//! - Error responses by code and status

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::application::monitoring::{ErrorEvent, ErrorMonitor};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// AI error counter - monitored error kinds dispatched to clients
pub static AI_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ai_errors_total", "AI component errors").namespace("lyo_api"),
        &["error_type", "error_code", "path"],
    )
    .expect("Failed to create AI_ERRORS_TOTAL metric")
});

/// Error response counter - every rendered error body
pub static ERROR_RESPONSES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("error_responses_total", "Error responses rendered by dispatch")
            .namespace("lyo_api"),
        &["code", "status"],
    )
    .expect("Failed to create ERROR_RESPONSES_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(AI_ERRORS_TOTAL.clone()))
        .expect("Failed to register AI_ERRORS_TOTAL");
    registry
        .register(Box::new(ERROR_RESPONSES_TOTAL.clone()))
        .expect("Failed to register ERROR_RESPONSES_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to record an error response
pub fn record_error_response(code: &str, status: u16) {
    let status = status.to_string();
    ERROR_RESPONSES_TOTAL
        .with_label_values(&[code, status.as_str()])
        .inc();
}

/// Error monitor counting monitored kinds in `AI_ERRORS_TOTAL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusErrorMonitor;

impl PrometheusErrorMonitor {
    /// Create the monitor, making sure the registry is initialized.
    pub fn new() -> Self {
        Lazy::force(&REGISTRY);
        Self
    }
}

impl ErrorMonitor for PrometheusErrorMonitor {
    fn record(&self, event: &ErrorEvent<'_>) {
        AI_ERRORS_TOTAL
            .with_label_values(&[event.error_type, event.error_code, event.path])
            .inc();
    }
}
