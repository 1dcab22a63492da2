//! CORS Middleware Configuration
//!
//! Browser clients need to read the correlation and retry headers attached
//! to error responses, so they are exposed explicitly.

use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::application::dispatch::REQUEST_ID_HEADER;
use crate::config::CorsSettings;

/// Create CORS layer from settings. `*` (or no parseable origin) allows any origin.
pub fn create_cors_layer(settings: &CorsSettings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| o.parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(exposed_headers())
        .max_age(Duration::from_secs(3600))
}

fn exposed_headers() -> [HeaderName; 3] {
    [
        HeaderName::from_static(REQUEST_ID_HEADER),
        header::RETRY_AFTER,
        header::WWW_AUTHENTICATE,
    ]
}
