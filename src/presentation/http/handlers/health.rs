//! Health Check Handlers
//!
//! Provides health check endpoints for Kubernetes-style liveness and readiness probes.
//!
//! # Endpoints
//! - `GET /health` - Basic health check
//! - `GET /health/live` - Liveness probe (is the server running?)
//! - `GET /health/ready` - Readiness probe (is error handling fully wired?)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::time::Instant;

use crate::application::registry::MONITORED_KINDS;
use crate::startup::AppState;

/// Server start time for uptime calculation
static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Initialize the server start time (call during startup)
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

/// Basic health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed health check response
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub registry: RegistryHealth,
}

/// Error registry wiring
#[derive(Debug, Serialize)]
pub struct RegistryHealth {
    pub status: HealthStatus,
    pub builtin_kinds: usize,
    pub extension_kinds: usize,
    pub monitored_kinds: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Overall health status
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Simple liveness response
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness probe - checks if the server is running
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive" })
}

/// Readiness probe - reports how the error registry was assembled.
/// Returns 503 only if a built-in kind is missing from dispatch.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = SERVER_START.elapsed().as_secs();
    let started_at = SERVER_START_TIME.to_rfc3339();

    let registry = check_registry(&state);
    let overall_status = registry.status;

    let response = DetailedHealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: uptime,
        started_at,
        checks: HealthChecks { registry },
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

fn check_registry(state: &AppState) -> RegistryHealth {
    let kinds = state.registry.kinds();
    let builtin_kinds = kinds.iter().filter(|k| k.is_builtin()).count();
    let extension_kinds = kinds.len() - builtin_kinds;
    let monitored_kinds = kinds
        .iter()
        .filter(|k| state.dispatch.is_monitored(k.code()))
        .count();

    let unbound = kinds
        .iter()
        .filter(|k| k.is_builtin() && !state.dispatch.is_bound(k.code()))
        .count();

    let (status, message) = if unbound > 0 {
        (
            HealthStatus::Unhealthy,
            Some(format!("{} built-in error kinds are not dispatched", unbound)),
        )
    } else if state.settings.errors.ai_extension && extension_kinds == 0 {
        (
            HealthStatus::Degraded,
            Some("AI extension enabled but contributed no error kinds".to_string()),
        )
    } else if state.settings.errors.monitor_ai_errors
        && extension_kinds > 0
        && MONITORED_KINDS.iter().all(|code| !state.dispatch.is_monitored(code))
    {
        (
            HealthStatus::Degraded,
            Some("AI error monitoring enabled but no kind is monitored".to_string()),
        )
    } else {
        (HealthStatus::Healthy, None)
    };

    RegistryHealth {
        status,
        builtin_kinds,
        extension_kinds,
        monitored_kinds,
        message,
    }
}
