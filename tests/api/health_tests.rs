//! Health Check API Tests

use axum::http::StatusCode;
use serde_json::Value;

use lyo_api::config::Settings;

use crate::common::TestApp;

/// Test basic health check endpoint returns 200 OK
#[tokio::test]
async fn test_health_check_returns_ok() {
    let app = TestApp::new();

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

/// Test liveness probe endpoint
#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::new();

    let response = app.server.get("/health/live").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "alive");
}

/// Test readiness probe reports the registry
#[tokio::test]
async fn test_readiness_probe() {
    let app = TestApp::new();

    let response = app.server.get("/health/ready").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["registry"]["builtin_kinds"], 9);
    assert_eq!(body["checks"]["registry"]["extension_kinds"], 9);
}

#[tokio::test]
async fn test_readiness_without_monitoring() {
    let mut settings = Settings::default();
    settings.errors.monitor_ai_errors = false;
    let app = TestApp::with_settings(settings);

    let response = app.server.get("/health/ready").await;

    response.assert_status(StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["checks"]["registry"]["monitored_kinds"], 0);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_error_counters() {
    let app = TestApp::new();

    app.server.get("/nowhere").await;
    let response = app.server.get("/metrics").await;

    response.assert_status_ok();
    assert!(response.text().contains("lyo_api_error_responses_total"));
}
