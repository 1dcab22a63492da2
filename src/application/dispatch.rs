//! Error Dispatch
//!
//! Renders every `Failure` reaching the HTTP boundary into the JSON error
//! envelope:
//!
//! ```text
//! { "error": { "code": "...", "message": "...", "status": 409, "request_id": "...", ... } }
//! ```
//!
//! One builder per failure family. All of them are pure functions of the
//! request context and the failure; the table itself is immutable once the
//! server starts.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Query},
    http::{header, HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    extract::CookieJar,
    headers::{HeaderMapExt, UserAgent},
};
use serde_json::{json, Map, Value};

use super::monitoring::{ErrorEvent, ErrorMonitor};
use super::translator::Translator;
use crate::shared::error::{AppError, ErrorKind, Failure, ProtocolError, UnclassifiedError};
use crate::shared::i18n::{self, LangQuery};
use crate::shared::validation::ValidationFailure;

/// Inbound correlation header, echoed into error bodies when present.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const VALIDATION_CODE: &str = "validation_error";
const VALIDATION_MESSAGE: &str = "Validation error";
const UNEXPECTED_CODE: &str = "internal_server_error";
const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred";

/// Envelope fields that `AppError::data` cannot overwrite.
const RESERVED_FIELDS: [&str; 4] = ["code", "message", "status", "request_id"];

/// Code for a bare protocol status.
pub fn protocol_code(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "bad_request",
        401 => "unauthorized",
        403 => "forbidden",
        404 => "not_found",
        405 => "method_not_allowed",
        406 => "not_acceptable",
        409 => "conflict",
        410 => "gone",
        415 => "unsupported_media_type",
        422 => "unprocessable_entity",
        429 => "too_many_requests",
        500 => "internal_server_error",
        501 => "not_implemented",
        502 => "bad_gateway",
        503 => "service_unavailable",
        504 => "gateway_timeout",
        _ => "error",
    }
}

/// The `error.code` a failure will be rendered with.
pub fn response_code(failure: &Failure) -> String {
    match failure {
        Failure::Application(error) => error.code().to_string(),
        Failure::Protocol(error) => protocol_code(error.status).to_string(),
        Failure::Validation(_) => VALIDATION_CODE.to_string(),
        Failure::Unclassified(_) => UNEXPECTED_CODE.to_string(),
    }
}

/// Cookie carrying the session identifier.
const SESSION_COOKIE: &str = "session_id";

/// Metrics label for requests that matched no route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Authenticated user, inserted into the request extensions by an
/// authentication layer running outside error dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

/// What the builders need to know about the request being answered.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// `X-Request-ID` as sent by the client, if it sent a non-empty one
    pub request_id: Option<String>,
    /// Negotiated response language
    pub language: String,
    pub method: Method,
    pub path: String,
    /// Matched route template, e.g. `/api/v1/errors/{code}`
    pub route: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
}

impl RequestContext {
    /// Context of a request inside the router, where the matched route and
    /// the authenticated user are available as extensions.
    pub fn from_request<B>(request: &Request<B>, default_language: &str) -> Self {
        let extensions = request.extensions();
        Self {
            route: extensions
                .get::<MatchedPath>()
                .map(|path| path.as_str().to_string()),
            user_id: extensions.get::<UserId>().map(|user| user.0.clone()),
            ..Self::from_parts(
                request.method(),
                request.uri(),
                request.headers(),
                default_language,
            )
        }
    }

    pub fn from_parts(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        default_language: &str,
    ) -> Self {
        let query_lang = Query::<LangQuery>::try_from_uri(uri)
            .ok()
            .and_then(|Query(query)| query.lang);
        let language = i18n::negotiate(
            query_lang.as_deref(),
            header_str(headers, header::ACCEPT_LANGUAGE.as_str()),
            default_language,
        );

        let session_id = CookieJar::from_headers(headers)
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string());

        Self {
            request_id: header_str(headers, REQUEST_ID_HEADER)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            language: language.to_string(),
            method: method.clone(),
            path: uri.path().to_string(),
            route: None,
            user_agent: headers
                .typed_get::<UserAgent>()
                .map(|agent| agent.as_str().to_string()),
            session_id,
            user_id: None,
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Route label for metrics. Never the raw path, which may embed ids.
    pub fn route_label(&self) -> &str {
        self.route.as_deref().unwrap_or(UNMATCHED_ROUTE)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[derive(Default)]
struct Binding {
    monitors: Vec<Arc<dyn ErrorMonitor>>,
}

/// Maps failures to responses. Built once at startup by
/// [`ErrorRegistry::register_all`](super::registry::ErrorRegistry::register_all).
pub struct DispatchTable {
    bindings: HashMap<&'static str, Binding>,
    translator: Arc<dyn Translator>,
    default_language: String,
    debug: bool,
}

impl DispatchTable {
    /// `debug` adds the raw failure text and type to unclassified responses.
    pub fn new(
        translator: Arc<dyn Translator>,
        default_language: impl Into<String>,
        debug: bool,
    ) -> Self {
        Self {
            bindings: HashMap::new(),
            translator,
            default_language: default_language.into(),
            debug,
        }
    }

    /// Route errors of `kind` through the application error handler.
    pub fn bind(&mut self, kind: ErrorKind) {
        self.bindings.entry(kind.code()).or_default();
    }

    /// Report dispatches of the bound kind `code` to `monitor`.
    /// Returns `false` when the kind is not bound.
    pub fn attach_monitor(&mut self, code: &str, monitor: Arc<dyn ErrorMonitor>) -> bool {
        match self.bindings.get_mut(code) {
            Some(binding) => {
                binding.monitors.push(monitor);
                true
            }
            None => false,
        }
    }

    pub fn is_bound(&self, code: &str) -> bool {
        self.bindings.contains_key(code)
    }

    pub fn is_monitored(&self, code: &str) -> bool {
        self.bindings
            .get(code)
            .is_some_and(|b| !b.monitors.is_empty())
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Render `failure` for the request described by `ctx`.
    pub fn dispatch(&self, ctx: &RequestContext, failure: Failure) -> Response {
        match failure {
            Failure::Application(error) => self.application_response(ctx, &error),
            Failure::Protocol(error) => self.protocol_response(ctx, &error),
            Failure::Validation(failure) => self.validation_response(ctx, &failure),
            Failure::Unclassified(error) => self.unclassified_response(ctx, &error),
        }
    }

    fn application_response(&self, ctx: &RequestContext, error: &AppError) -> Response {
        let kind = error.kind();
        match self.bindings.get(kind.code()) {
            Some(binding) => {
                let event = ErrorEvent {
                    error_type: kind.spec().name,
                    error_code: error.code(),
                    path: ctx.route_label(),
                };
                for monitor in &binding.monitors {
                    monitor.record(&event);
                }
            }
            None => tracing::debug!(kind = %kind, "Dispatching an unregistered error kind"),
        }

        let status = error.status();
        if status.is_server_error() {
            tracing::error!(
                request_id = ctx.request_id.as_deref(),
                method = %ctx.method,
                path = %ctx.path,
                kind = %kind,
                code = error.code(),
                detail = error.detail(),
                "Application error"
            );
        } else {
            tracing::debug!(
                request_id = ctx.request_id.as_deref(),
                path = %ctx.path,
                kind = %kind,
                code = error.code(),
                status = status.as_u16(),
                "Application error"
            );
        }

        let message = self.translate(error.detail(), &ctx.language);
        let mut body = envelope(error.code(), message, status, ctx);
        for (key, value) in error.data() {
            if RESERVED_FIELDS.contains(&key.as_str()) {
                tracing::debug!(field = %key, "Ignoring error data that would overwrite an envelope field");
                continue;
            }
            body.insert(key.clone(), value.clone());
        }
        render(status, error.headers().clone(), body)
    }

    fn protocol_response(&self, ctx: &RequestContext, error: &ProtocolError) -> Response {
        tracing::debug!(
            request_id = ctx.request_id.as_deref(),
            path = %ctx.path,
            status = error.status.as_u16(),
            detail = %error.detail,
            "Protocol error"
        );
        let message = self.translate(&error.detail, &ctx.language);
        let body = envelope(protocol_code(error.status), message, error.status, ctx);
        render(error.status, error.headers.clone(), body)
    }

    fn validation_response(&self, ctx: &RequestContext, failure: &ValidationFailure) -> Response {
        tracing::debug!(
            request_id = ctx.request_id.as_deref(),
            path = %ctx.path,
            failures = failure.errors().len(),
            "Request validation failed"
        );
        let status = StatusCode::UNPROCESSABLE_ENTITY;
        let message = self.translate(VALIDATION_MESSAGE, &ctx.language);
        let mut body = envelope(VALIDATION_CODE, message, status, ctx);
        let errors: Vec<Value> = failure
            .errors()
            .iter()
            .map(|e| {
                json!({
                    "loc": e.loc,
                    "msg": self.translate(&e.msg, &ctx.language),
                    "type": e.kind,
                })
            })
            .collect();
        body.insert("errors".into(), Value::Array(errors));
        render(status, HeaderMap::new(), body)
    }

    fn unclassified_response(&self, ctx: &RequestContext, error: &UnclassifiedError) -> Response {
        tracing::error!(
            request_id = ctx.request_id.as_deref(),
            method = %ctx.method,
            path = %ctx.path,
            error_type = %error.type_name,
            error_message = %error.message,
            error_causes = ?error.causes,
            "Unhandled error"
        );
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let message = self.translate(UNEXPECTED_MESSAGE, &ctx.language);
        let mut body = envelope(UNEXPECTED_CODE, message, status, ctx);
        if self.debug {
            body.insert("detail".into(), Value::String(error.message.clone()));
            body.insert("type".into(), Value::String(error.type_name.to_string()));
        }
        render(status, HeaderMap::new(), body)
    }

    /// Translator failures fall back to the untranslated text.
    fn translate(&self, key: &str, language: &str) -> String {
        if key.is_empty() {
            return String::new();
        }
        match self.translator.translate(key, language) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(language, error = %e, "Translation failed, using source text");
                key.to_string()
            }
        }
    }
}

fn envelope(code: &str, message: String, status: StatusCode, ctx: &RequestContext) -> Map<String, Value> {
    let mut error = Map::new();
    error.insert("code".into(), Value::String(code.to_string()));
    error.insert("message".into(), Value::String(message));
    error.insert("status".into(), Value::from(status.as_u16()));
    if let Some(request_id) = &ctx.request_id {
        error.insert("request_id".into(), Value::String(request_id.clone()));
    }
    error
}

fn render(status: StatusCode, headers: HeaderMap, error: Map<String, Value>) -> Response {
    (status, headers, Json(json!({ "error": Value::Object(error) }))).into_response()
}
