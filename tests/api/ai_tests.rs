//! AI Error API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use lyo_api::infrastructure::metrics::AI_ERRORS_TOTAL;

use crate::common::TestApp;

#[tokio::test]
async fn test_sub_kind_renders_with_own_code_and_data() {
    let app = TestApp::failing(false);

    let response = app.server.get("/ai/recommendation").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({"error": {
            "code": "recommendation_error",
            "message": "Failed to generate recommendations",
            "status": 500,
            "recommendation_type": "course"
        }})
    );
}

#[tokio::test]
async fn test_quota_exceeded_sets_retry_after() {
    let app = TestApp::failing(false);

    let response = app.server.get("/ai/quota").await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.header("retry-after"), "120");
    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "ai_quota_exceeded");
    assert_eq!(body["error"]["quota_type"], "daily");
    assert_eq!(body["error"]["reset_time"], 120);
}

#[tokio::test]
async fn test_prediction_timeout_is_gateway_timeout() {
    let app = TestApp::failing(false);

    let response = app.server.get("/ai/timeout").await;

    response.assert_status(StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(response.json::<Value>()["error"]["code"], "prediction_timeout");
}

#[tokio::test]
async fn test_monitored_kinds_are_counted() {
    let app = TestApp::translated();
    let model = ["ModelExecutionError", "model_execution_error", "/ai/{kind}"];
    let recommendation = ["RecommendationError", "recommendation_error", "/ai/{kind}"];
    let timeout = ["PredictionTimeoutError", "prediction_timeout", "/ai/{kind}"];
    let before = [model, recommendation, timeout]
        .map(|labels| AI_ERRORS_TOTAL.with_label_values(&labels).get());

    app.server.get("/ai/model").await;
    app.server.get("/ai/recommendation").await;
    app.server.get("/ai/timeout").await;

    let after = [model, recommendation, timeout]
        .map(|labels| AI_ERRORS_TOTAL.with_label_values(&labels).get());
    assert_eq!(after[0], before[0] + 1);
    // recommendation_error is monitored through algorithm_error
    assert_eq!(after[1], before[1] + 1);
    assert_eq!(after[2], before[2]);
}

#[tokio::test]
async fn test_monitored_kinds_labelled_by_route_template() {
    let app = TestApp::translated();

    app.server.get("/ai/model").await;

    let raw_path = ["ModelExecutionError", "model_execution_error", "/ai/model"];
    assert_eq!(AI_ERRORS_TOTAL.with_label_values(&raw_path).get(), 0);
}
