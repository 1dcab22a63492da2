//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{response::IntoResponse, routing::get, Router};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{cors, logging, with_error_handling};
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .nest("/api/v1", api_routes())
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .with_state(state.clone())
        .layer(logging::create_trace_layer());

    // Error dispatch wraps everything so unknown routes are rendered too
    with_error_handling(router, state.dispatch.clone())
        .layer(cors::create_cors_layer(&state.settings.cors))
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/errors", get(handlers::errors::list_error_kinds))
        .route("/errors/{code}", get(handlers::errors::get_error_kind))
        .route("/languages", get(handlers::errors::list_languages))
}
