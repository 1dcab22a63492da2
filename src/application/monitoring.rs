//! Error Monitoring
//!
//! Hook invoked for every dispatched error of a monitored kind.

/// One dispatched error, as seen by a monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorEvent<'a> {
    /// Kind name, e.g. "RecommendationError"
    pub error_type: &'a str,
    /// Code sent to the client
    pub error_code: &'a str,
    /// Matched route template, or `unmatched` when no route matched
    pub path: &'a str,
}

/// Telemetry collaborator receiving monitored errors.
pub trait ErrorMonitor: Send + Sync {
    fn record(&self, event: &ErrorEvent<'_>);
}
