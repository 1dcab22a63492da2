//! Error Catalog API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use lyo_api::config::Settings;

use crate::common::TestApp;

#[tokio::test]
async fn test_catalog_lists_builtin_then_extension_kinds() {
    let app = TestApp::new();

    let response = app.server.get("/api/v1/errors").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    let kinds = body["kinds"].as_array().unwrap();
    assert_eq!(kinds.len(), 18);
    assert_eq!(kinds[0]["builtin"], true);
    assert_eq!(kinds[9]["code"], "algorithm_error");
    assert_eq!(kinds[9]["builtin"], false);
    assert_eq!(
        kinds[10],
        json!({
            "name": "RecommendationError",
            "code": "recommendation_error",
            "status": 500,
            "message": "Failed to generate recommendations",
            "parent": "algorithm_error",
            "builtin": false
        })
    );
}

#[tokio::test]
async fn test_catalog_without_extension() {
    let mut settings = Settings::default();
    settings.errors.ai_extension = false;
    let app = TestApp::with_settings(settings);

    let response = app.server.get("/api/v1/errors").await;

    assert_eq!(response.json::<Value>()["kinds"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn test_single_kind_lookup() {
    let app = TestApp::new();

    let response = app.server.get("/api/v1/errors/ai_quota_exceeded").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], 429);
}

#[tokio::test]
async fn test_unknown_kind_is_not_found() {
    let app = TestApp::new();

    let response = app.server.get("/api/v1/errors/nope").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<Value>(),
        json!({"error": {
            "code": "not_found",
            "message": "Error kind not found",
            "status": 404,
            "kind": "nope"
        }})
    );
}

#[tokio::test]
async fn test_languages_listed() {
    let app = TestApp::new();

    let response = app.server.get("/api/v1/languages").await;

    let body = response.json::<Value>();
    assert_eq!(body["default"], "en-US");
    assert_eq!(body["languages"].as_array().unwrap().len(), 11);
}
