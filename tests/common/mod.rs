//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::Path,
    http::{HeaderName, HeaderValue, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_test::TestServer;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use lyo_api::application::dispatch::{DispatchTable, RequestContext, UserId};
use lyo_api::application::registry::{ErrorExtension, ErrorRegistry};
use lyo_api::application::translator::CatalogTranslator;
use lyo_api::config::Settings;
use lyo_api::extensions::{ai, AiErrorExtension};
use lyo_api::infrastructure::metrics::PrometheusErrorMonitor;
use lyo_api::presentation::http::routes;
use lyo_api::presentation::http::ValidatedJson;
use lyo_api::presentation::middleware::with_error_handling;
use lyo_api::shared::error::{AppError, Failure, ProtocolError};
use lyo_api::startup::build_state;

pub const REQUEST_ID: &str = "x-request-id";

/// Test application builder
pub struct TestApp {
    pub server: TestServer,
}

impl TestApp {
    /// The production router
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let state = build_state(settings).unwrap();
        let server = TestServer::new(routes::create_router(state)).unwrap();
        Self { server }
    }

    /// Handlers raising every failure family behind the error middleware
    pub fn failing(debug: bool) -> Self {
        let mut settings = Settings::default();
        settings.app.debug = debug;
        let state = build_state(settings).unwrap();
        let router = with_error_handling(failing_routes(), state.dispatch.clone());
        Self {
            server: TestServer::new(router).unwrap(),
        }
    }

    /// Like [`TestApp::failing`], behind an authentication layer that
    /// identifies the caller as `user_id`
    pub fn authenticated(user_id: &str) -> Self {
        let state = build_state(Settings::default()).unwrap();
        let router = with_error_handling(failing_routes(), state.dispatch.clone())
            .layer(Extension(UserId(user_id.to_string())));
        Self {
            server: TestServer::new(router).unwrap(),
        }
    }

    /// Like [`TestApp::failing`], translating into Spanish from an in-memory catalog
    pub fn translated() -> Self {
        let catalog = HashMap::from([
            ("User already exists".to_string(), "El usuario ya existe".to_string()),
            ("Validation error".to_string(), "Error de validación".to_string()),
            (
                "Value has an invalid length".to_string(),
                "El valor tiene una longitud no válida".to_string(),
            ),
        ]);
        let translator = CatalogTranslator::new(
            HashMap::from([("es-ES".to_string(), catalog)]),
            "en-US",
        );

        let registry = ErrorRegistry::with_extension(Some(&AiErrorExtension as &dyn ErrorExtension));
        let mut dispatch = DispatchTable::new(Arc::new(translator), "en-US", false);
        registry.register_all(&mut dispatch, Some(Arc::new(PrometheusErrorMonitor::new())));

        let router = with_error_handling(failing_routes(), Arc::new(dispatch));
        Self {
            server: TestServer::new(router).unwrap(),
        }
    }
}

pub fn header(name: &'static str) -> HeaderName {
    HeaderName::from_static(name)
}

pub fn value(value: &'static str) -> HeaderValue {
    HeaderValue::from_static(value)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 3))]
    pub username: String,
    #[validate(email)]
    pub email: String,
}

fn failing_routes() -> Router {
    Router::new()
        .route("/users", post(create_user))
        .route("/conflict", get(conflict))
        .route("/teapot", get(teapot))
        .route("/bare-teapot", get(bare_teapot))
        .route("/rate-limited", get(rate_limited))
        .route("/unauthorized", get(unauthorized))
        .route("/panic", get(panic))
        .route("/anyhow", get(anyhow_error))
        .route("/ai/{kind}", get(ai_failure))
        .route("/ok", get(|| async { "ok" }))
        .route("/posts/{id}/context", get(request_context))
}

async fn create_user(ValidatedJson(user): ValidatedJson<CreateUser>) -> Json<Value> {
    Json(json!({ "username": user.username }))
}

async fn conflict() -> Result<Json<Value>, AppError> {
    Err(AppError::conflict("User already exists"))
}

async fn teapot() -> Result<(), Failure> {
    Err(ProtocolError::from_status(StatusCode::IM_A_TEAPOT).into())
}

async fn bare_teapot() -> StatusCode {
    StatusCode::IM_A_TEAPOT
}

async fn rate_limited() -> Result<(), AppError> {
    Err(AppError::too_many_requests("Slow down", Some(30)))
}

async fn unauthorized() -> Result<(), AppError> {
    Err(AppError::unauthorized("Token expired"))
}

async fn panic() -> &'static str {
    panic!("boom")
}

async fn anyhow_error() -> Result<(), Failure> {
    let err = anyhow::anyhow!("connection refused").context("Failed to load feed");
    Err(err.into())
}

async fn ai_failure(Path(kind): Path<String>) -> Result<(), AppError> {
    Err(match kind.as_str() {
        "recommendation" => ai::recommendation_error(Some("course")),
        "model" => ai::model_execution_error(Some("ranker-v2"), Some("oom")),
        "quota" => ai::ai_quota_exceeded(Some("daily"), Some(120)),
        "timeout" => ai::prediction_timeout(Some("ranker-v2"), Some(5)),
        _ => AppError::not_found("Unknown AI failure"),
    })
}

async fn request_context(Extension(ctx): Extension<RequestContext>) -> Json<Value> {
    Json(json!({
        "language": ctx.language,
        "route": ctx.route,
        "user_id": ctx.user_id,
        "session_id": ctx.session_id,
    }))
}
