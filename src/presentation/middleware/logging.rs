//! Request Logging
//!
//! HTTP request spans carrying the request ID.

use axum::{body::Body, http::Request};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::TraceLayer,
};
use tracing::Span;

use super::request_id::RequestId;

/// Trace layer type produced by [`create_trace_layer`]
pub type HttpTraceLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, fn(&Request<Body>) -> Span>;

/// Create the HTTP trace layer
pub fn create_trace_layer() -> HttpTraceLayer {
    TraceLayer::new_for_http().make_span_with(make_span as fn(&Request<Body>) -> Span)
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.as_str())
        .unwrap_or("-");
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}
