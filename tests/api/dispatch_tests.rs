//! Error Dispatch API Tests
//!
//! Every failure family rendered through the middleware stack.

use axum::{body::Bytes, http::StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{header, value, TestApp, REQUEST_ID};

#[tokio::test]
async fn test_application_error_renders_envelope() {
    let app = TestApp::failing(false);

    let response = app
        .server
        .get("/conflict")
        .add_header(header(REQUEST_ID), value("abc"))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(
        response.json::<Value>(),
        json!({"error": {
            "code": "conflict",
            "message": "User already exists",
            "status": 409,
            "request_id": "abc"
        }})
    );
    assert_eq!(response.header(REQUEST_ID), "abc");
}

#[tokio::test]
async fn test_request_id_generated_but_not_in_body() {
    let app = TestApp::failing(false);

    let response = app.server.get("/conflict").await;

    let body = response.json::<Value>();
    assert!(body["error"].get("request_id").is_none());
    let generated = response.header(REQUEST_ID);
    assert_eq!(generated.to_str().unwrap().len(), 36);
}

#[tokio::test]
async fn test_success_passes_through_untouched() {
    let app = TestApp::failing(false);

    let response = app.server.get("/ok").await;

    response.assert_status_ok();
    response.assert_text("ok");
    assert!(response.maybe_header(REQUEST_ID).is_some());
}

#[tokio::test]
async fn test_unknown_route_is_protocol_not_found() {
    let app = TestApp::failing(false);

    let response = app
        .server
        .get("/nowhere")
        .add_header(header(REQUEST_ID), value("r-404"))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<Value>(),
        json!({"error": {
            "code": "not_found",
            "message": "Not Found",
            "status": 404,
            "request_id": "r-404"
        }})
    );
}

#[tokio::test]
async fn test_wrong_method_keeps_allow_header() {
    let app = TestApp::failing(false);

    let response = app.server.delete("/conflict").await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "method_not_allowed");
    assert_eq!(body["error"]["status"], 405);
    assert!(response
        .header("allow")
        .to_str()
        .unwrap()
        .contains("GET"));
}

#[tokio::test]
async fn test_unmapped_protocol_status_uses_generic_code() {
    let app = TestApp::failing(false);

    for path in ["/teapot", "/bare-teapot"] {
        let response = app.server.get(path).await;

        response.assert_status(StatusCode::IM_A_TEAPOT);
        let body = response.json::<Value>();
        assert_eq!(body["error"]["code"], "error");
        assert_eq!(body["error"]["status"], 418);
        assert_eq!(body["error"]["message"], "I'm a teapot");
    }
}

#[tokio::test]
async fn test_validation_failure_lists_fields() {
    let app = TestApp::failing(false);

    let response = app
        .server
        .post("/users")
        .add_header(header(REQUEST_ID), value("r-422"))
        .json(&json!({"username": "ab", "email": "not-an-email"}))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.json::<Value>(),
        json!({"error": {
            "code": "validation_error",
            "message": "Validation error",
            "status": 422,
            "request_id": "r-422",
            "errors": [
                {"loc": ["body", "email"], "msg": "Value is not a valid email address", "type": "email"},
                {"loc": ["body", "username"], "msg": "Value has an invalid length", "type": "length"}
            ]
        }})
    );
}

#[tokio::test]
async fn test_valid_body_reaches_handler() {
    let app = TestApp::failing(false);

    let response = app
        .server
        .post("/users")
        .json(&json!({"username": "ada", "email": "ada@example.com"}))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({"username": "ada"}));
}

#[tokio::test]
async fn test_body_of_wrong_shape_is_validation_failure() {
    let app = TestApp::failing(false);

    let response = app.server.post("/users").json(&json!({"username": "ada"})).await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.json::<Value>();
    let errors = body["error"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["loc"], json!(["body"]));
    assert_eq!(errors[0]["type"], "value_error");
}

#[tokio::test]
async fn test_malformed_json_is_protocol_bad_request() {
    let app = TestApp::failing(false);

    let response = app
        .server
        .post("/users")
        .bytes(Bytes::from_static(b"{not json"))
        .content_type("application/json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_retry_after_header_preserved() {
    let app = TestApp::failing(false);

    let response = app.server.get("/rate-limited").await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.header("retry-after"), "30");
    assert_eq!(response.json::<Value>()["error"]["code"], "too_many_requests");
}

#[tokio::test]
async fn test_unauthorized_carries_bearer_challenge() {
    let app = TestApp::failing(false);

    let response = app.server.get("/unauthorized").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.header("www-authenticate"), "Bearer");
    assert_eq!(response.json::<Value>()["error"]["message"], "Token expired");
}

#[tokio::test]
async fn test_panic_hides_detail_without_debug() {
    let app = TestApp::failing(false);

    let response = app
        .server
        .get("/panic")
        .add_header(header(REQUEST_ID), value("r-500"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({"error": {
            "code": "internal_server_error",
            "message": "An unexpected error occurred",
            "status": 500,
            "request_id": "r-500"
        }})
    );
}

#[tokio::test]
async fn test_panic_shows_detail_in_debug() {
    let app = TestApp::failing(true);

    let response = app.server.get("/panic").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["detail"], "boom");
    assert_eq!(body["error"]["type"], "panic");
}

#[tokio::test]
async fn test_unexpected_error_is_unclassified() {
    let app = TestApp::failing(true);

    let response = app.server.get("/anyhow").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "internal_server_error");
    assert_eq!(body["error"]["detail"], "Failed to load feed");
}

#[tokio::test]
async fn test_messages_translated_by_accept_language() {
    let app = TestApp::translated();

    let response = app
        .server
        .get("/conflict")
        .add_header(header("accept-language"), value("es;q=0.9, en;q=0.5"))
        .await;
    assert_eq!(response.json::<Value>()["error"]["message"], "El usuario ya existe");

    let response = app
        .server
        .post("/users?lang=es-ES")
        .json(&json!({"username": "ab", "email": "ada@example.com"}))
        .await;
    let body = response.json::<Value>();
    assert_eq!(body["error"]["message"], "Error de validación");
    assert_eq!(
        body["error"]["errors"][0]["msg"],
        "El valor tiene una longitud no válida"
    );
}

#[tokio::test]
async fn test_unsupported_language_falls_back_to_default() {
    let app = TestApp::translated();

    let response = app
        .server
        .get("/conflict")
        .add_header(header("accept-language"), value("sv-SE"))
        .await;

    assert_eq!(response.json::<Value>()["error"]["message"], "User already exists");
}

#[tokio::test]
async fn test_empty_request_id_treated_as_absent() {
    let app = TestApp::failing(false);

    let response = app
        .server
        .get("/conflict")
        .add_header(header(REQUEST_ID), value(""))
        .await;

    assert!(response.json::<Value>()["error"].get("request_id").is_none());
    assert_eq!(response.header(REQUEST_ID).to_str().unwrap().len(), 36);
}

#[tokio::test]
async fn test_handlers_see_request_context() {
    let app = TestApp::authenticated("u-42");

    let response = app
        .server
        .get("/posts/17/context?lang=zh%2DTW")
        .add_header(header("cookie"), value("theme=dark; session_id=s-9"))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({
            "language": "zh-TW",
            "route": "/posts/{id}/context",
            "user_id": "u-42",
            "session_id": "s-9"
        })
    );
}
