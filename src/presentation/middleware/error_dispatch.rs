//! Error Dispatch Middleware
//!
//! Intercepts failures on their way out and renders them through the
//! [`DispatchTable`]:
//!
//! - typed failures (`AppError`, `Failure`) travel in the response extensions
//! - bare framework error responses (unknown route, wrong method, rejected
//!   extractors) become protocol failures
//! - panics are caught and become unclassified failures

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;

use crate::application::dispatch::{response_code, DispatchTable, RequestContext};
use crate::infrastructure::metrics;
use crate::presentation::middleware::request_id::request_id;
use crate::shared::error::{Failure, ProtocolError, UnclassifiedError};

/// Upper bound on framework error bodies kept as protocol detail
const MAX_DETAIL_BYTES: usize = 4096;

/// Framework headers that must survive re-rendering
const PASSTHROUGH_HEADERS: [header::HeaderName; 3] =
    [header::ALLOW, header::RETRY_AFTER, header::WWW_AUTHENTICATE];

/// Wrap `router` with panic catching, error dispatch and request IDs.
pub fn with_error_handling(router: Router, dispatch: Arc<DispatchTable>) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn(request_id))
            .layer(middleware::from_fn_with_state(dispatch, dispatch_errors))
            .layer(CatchPanicLayer::custom(panic_response)),
    )
}

/// Render failures escaping the inner service
pub async fn dispatch_errors(
    State(dispatch): State<Arc<DispatchTable>>,
    mut request: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_request(&request, dispatch.default_language());
    // Handlers reach the same context through `Extension<RequestContext>`
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;

    let failure = match response.extensions_mut().remove::<Failure>() {
        Some(failure) => failure,
        None if is_bare_error(&response) => protocol_failure(response).await,
        None => return response,
    };

    let code = response_code(&failure);
    let response = dispatch.dispatch(&ctx, failure);
    metrics::record_error_response(&code, response.status().as_u16());
    response
}

/// Turn a caught panic into an unclassified failure
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    Failure::Unclassified(UnclassifiedError::from_panic(payload)).into_response()
}

/// Error status without a structured body, i.e. produced by the framework
fn is_bare_error(response: &Response) -> bool {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return false;
    }
    match response.headers().get(header::CONTENT_TYPE) {
        None => true,
        Some(value) => value
            .to_str()
            .map(|v| v.starts_with("text/plain"))
            .unwrap_or(false),
    }
}

async fn protocol_failure(response: Response) -> Failure {
    let (parts, body) = response.into_parts();
    let detail = match axum::body::to_bytes(body, MAX_DETAIL_BYTES).await {
        Ok(bytes) if !bytes.is_empty() => String::from_utf8_lossy(&bytes).trim().to_string(),
        _ => parts
            .status
            .canonical_reason()
            .unwrap_or("Error")
            .to_string(),
    };

    let mut error = ProtocolError::new(parts.status, detail);
    for name in PASSTHROUGH_HEADERS {
        if let Some(value) = parts.headers.get(&name) {
            error.headers.insert(name, value.clone());
        }
    }
    error.into()
}
