//! Application Error Types
//!
//! Error kinds, the `AppError` instance type and the `Failure` taxonomy that
//! the dispatch middleware renders into JSON error bodies.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;

use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use super::validation::ValidationFailure;

/// Static description of an error kind: its default status, code and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KindSpec {
    /// Type-style name used in logs and metrics (e.g. "AlgorithmError")
    pub name: &'static str,
    /// Machine-readable code, unique per kind
    pub code: &'static str,
    /// Default HTTP status, always in 400..=599
    pub status: u16,
    /// Default human-readable message template
    pub message: &'static str,
    /// Code of the parent kind, `None` for direct sub-kinds of the base error
    pub parent: Option<&'static str>,
}

impl KindSpec {
    /// Declare a kind at compile time. Panics (in const context, at build
    /// time) if the status is not a client or server error.
    pub const fn new(
        name: &'static str,
        code: &'static str,
        status: u16,
        message: &'static str,
    ) -> Self {
        assert!(status >= 400 && status <= 599, "error kinds use 4xx/5xx statuses");
        Self {
            name,
            code,
            status,
            message,
            parent: None,
        }
    }

    /// Declare this kind as a sub-kind of `parent`.
    pub const fn child_of(mut self, parent: &KindSpec) -> Self {
        self.parent = Some(parent.code);
        self
    }

    /// Default status as a `StatusCode`.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// The base application error. Every registered kind is a strict sub-kind of it.
pub const APPLICATION_ERROR: KindSpec = KindSpec::new(
    "ApplicationError",
    "api_error",
    500,
    "An error occurred",
);

const NOT_FOUND: KindSpec = KindSpec::new("NotFoundError", "not_found", 404, "Resource not found");
const VALIDATION_FAILED: KindSpec =
    KindSpec::new("ValidationAPIError", "validation_error", 422, "Validation error");
const UNAUTHORIZED: KindSpec =
    KindSpec::new("UnauthorizedError", "unauthorized", 401, "Not authenticated");
const FORBIDDEN: KindSpec =
    KindSpec::new("ForbiddenError", "forbidden", 403, "Not enough permissions");
const BAD_REQUEST: KindSpec = KindSpec::new("BadRequestError", "bad_request", 400, "Bad request");
const INTERNAL_SERVER_ERROR: KindSpec = KindSpec::new(
    "InternalServerError",
    "internal_server_error",
    500,
    "Internal server error",
);
const CONFLICT: KindSpec = KindSpec::new("ConflictError", "conflict", 409, "Resource conflict");
const SERVICE_UNAVAILABLE: KindSpec = KindSpec::new(
    "ServiceUnavailableError",
    "service_unavailable",
    503,
    "Service unavailable",
);
const TOO_MANY_REQUESTS: KindSpec = KindSpec::new(
    "TooManyRequestsError",
    "too_many_requests",
    429,
    "Too many requests",
);

/// Category of an application failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    ValidationFailed,
    Unauthorized,
    Forbidden,
    BadRequest,
    InternalServerError,
    Conflict,
    ServiceUnavailable,
    TooManyRequests,
    /// Kind contributed by an extension module at startup
    Extension(KindSpec),
}

/// Built-in kinds in registration order.
pub const BUILTIN_KINDS: [ErrorKind; 9] = [
    ErrorKind::NotFound,
    ErrorKind::ValidationFailed,
    ErrorKind::Unauthorized,
    ErrorKind::Forbidden,
    ErrorKind::BadRequest,
    ErrorKind::InternalServerError,
    ErrorKind::Conflict,
    ErrorKind::ServiceUnavailable,
    ErrorKind::TooManyRequests,
];

impl ErrorKind {
    /// Defaults attached to this kind.
    pub fn spec(&self) -> KindSpec {
        match self {
            ErrorKind::NotFound => NOT_FOUND,
            ErrorKind::ValidationFailed => VALIDATION_FAILED,
            ErrorKind::Unauthorized => UNAUTHORIZED,
            ErrorKind::Forbidden => FORBIDDEN,
            ErrorKind::BadRequest => BAD_REQUEST,
            ErrorKind::InternalServerError => INTERNAL_SERVER_ERROR,
            ErrorKind::Conflict => CONFLICT,
            ErrorKind::ServiceUnavailable => SERVICE_UNAVAILABLE,
            ErrorKind::TooManyRequests => TOO_MANY_REQUESTS,
            ErrorKind::Extension(spec) => *spec,
        }
    }

    pub fn code(&self) -> &'static str {
        self.spec().code
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, ErrorKind::Extension(_))
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().name)
    }
}

/// Intentional, application-raised failure.
///
/// Carries everything the response builder needs: status, code, message
/// template, extra response headers and structured context merged into the
/// error body.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code} ({status}): {detail}")]
pub struct AppError {
    kind: ErrorKind,
    status: StatusCode,
    detail: String,
    code: Cow<'static, str>,
    headers: HeaderMap,
    data: Map<String, Value>,
}

impl AppError {
    /// Create an error with every field defaulted from `kind`.
    pub fn new(kind: ErrorKind) -> Self {
        let spec = kind.spec();
        let mut error = Self {
            kind,
            status: spec.status_code(),
            detail: spec.message.to_string(),
            code: Cow::Borrowed(spec.code),
            headers: HeaderMap::new(),
            data: Map::new(),
        };
        if kind == ErrorKind::Unauthorized {
            error
                .headers
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        error
    }

    /// Create an error of an extension kind.
    pub fn extension(spec: KindSpec) -> Self {
        Self::new(ErrorKind::Extension(spec))
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound).with_detail(detail)
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailed).with_detail(detail)
    }

    /// 401 with `WWW-Authenticate: Bearer`.
    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized).with_detail(detail)
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden).with_detail(detail)
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest).with_detail(detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalServerError).with_detail(detail)
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict).with_detail(detail)
    }

    pub fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable).with_detail(detail)
    }

    /// 429, with `Retry-After` when `retry_after` is given.
    pub fn too_many_requests(detail: impl Into<String>, retry_after: Option<u64>) -> Self {
        let error = Self::new(ErrorKind::TooManyRequests).with_detail(detail);
        match retry_after {
            Some(seconds) => error.with_retry_after(seconds),
            None => error,
        }
    }

    /// Replace the message template. An empty detail is allowed.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Override the status for this instance. Statuses outside 400..=599 are
    /// ignored and the kind's default is kept.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        if status.is_client_error() || status.is_server_error() {
            self.status = status;
        } else {
            tracing::warn!(
                kind = %self.kind,
                status = status.as_u16(),
                "Ignoring non-error status override"
            );
        }
        self
    }

    pub fn with_code(mut self, code: impl Into<Cow<'static, str>>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_retry_after(self, seconds: u64) -> Self {
        self.with_header(header::RETRY_AFTER, HeaderValue::from(seconds))
    }

    /// Attach a context value merged into the error body.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Attach a context value only when present.
    pub fn with_optional_data<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_data(key, value),
            None => self,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}

impl From<ErrorKind> for AppError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Failure raised below the application layer: a bare HTTP status with
/// whatever detail the framework produced.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    pub status: StatusCode,
    pub detail: String,
    pub headers: HeaderMap,
}

impl ProtocolError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Protocol failure whose detail is the status' canonical reason.
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status, status.canonical_reason().unwrap_or("Error"))
    }
}

/// Anything that escaped without being classified.
#[derive(Debug, Clone)]
pub struct UnclassifiedError {
    /// Runtime type name of the original failure
    pub type_name: Cow<'static, str>,
    /// Display text of the original failure
    pub message: String,
    /// Source chain, outermost first (excluding `message`)
    pub causes: Vec<String>,
}

impl UnclassifiedError {
    /// Capture an arbitrary error together with its concrete type name.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            type_name: Cow::Borrowed(std::any::type_name::<E>()),
            message: error.to_string(),
            causes,
        }
    }

    /// Capture a panic payload caught at the HTTP boundary.
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with non-string payload".to_string()
        };
        Self {
            type_name: Cow::Borrowed("panic"),
            message,
            causes: Vec::new(),
        }
    }
}

impl From<anyhow::Error> for UnclassifiedError {
    fn from(error: anyhow::Error) -> Self {
        Self {
            type_name: Cow::Borrowed("anyhow::Error"),
            message: error.to_string(),
            causes: error.chain().skip(1).map(ToString::to_string).collect(),
        }
    }
}

/// Every failure that can reach the HTTP boundary.
#[derive(Debug, Clone)]
pub enum Failure {
    Application(AppError),
    Protocol(ProtocolError),
    Validation(ValidationFailure),
    Unclassified(UnclassifiedError),
}

impl Failure {
    /// Status the rendered response will carry.
    pub fn status(&self) -> StatusCode {
        match self {
            Failure::Application(e) => e.status(),
            Failure::Protocol(e) => e.status,
            Failure::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Failure::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for Failure {
    fn from(error: AppError) -> Self {
        Failure::Application(error)
    }
}

impl From<ProtocolError> for Failure {
    fn from(error: ProtocolError) -> Self {
        Failure::Protocol(error)
    }
}

impl From<ValidationFailure> for Failure {
    fn from(failure: ValidationFailure) -> Self {
        Failure::Validation(failure)
    }
}

impl From<UnclassifiedError> for Failure {
    fn from(error: UnclassifiedError) -> Self {
        Failure::Unclassified(error)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        Failure::Unclassified(error.into())
    }
}

/// The body is rendered later by the error dispatch middleware, which has
/// the request context (request id, language). The failure travels in the
/// response extensions until then.
impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        Failure::Application(self).into_response()
    }
}
