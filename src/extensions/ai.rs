//! AI Error Extension
//!
//! Error kinds raised by the recommendation, feed, moderation and model
//! execution components, plus helpers to log them with request context and
//! to degrade gracefully when an AI feature fails.

use std::future::Future;

use serde::Serialize;
use tracing::Level;

use crate::application::dispatch::RequestContext;
use crate::application::registry::{ErrorExtension, ExtensionError};
use crate::shared::error::{AppError, ErrorKind, KindSpec};

pub const ALGORITHM_ERROR: KindSpec = KindSpec::new(
    "AlgorithmError",
    "algorithm_error",
    500,
    "Algorithm processing error",
);
pub const RECOMMENDATION_ERROR: KindSpec = KindSpec::new(
    "RecommendationError",
    "recommendation_error",
    500,
    "Failed to generate recommendations",
)
.child_of(&ALGORITHM_ERROR);
pub const FEED_PROCESSING_ERROR: KindSpec = KindSpec::new(
    "FeedProcessingError",
    "feed_processing_error",
    500,
    "Failed to process feed data",
)
.child_of(&ALGORITHM_ERROR);
pub const AD_PERSONALIZATION_ERROR: KindSpec = KindSpec::new(
    "AdPersonalizationError",
    "ad_personalization_error",
    500,
    "Failed to personalize advertisements",
)
.child_of(&ALGORITHM_ERROR);
pub const DATA_PROCESSING_ERROR: KindSpec = KindSpec::new(
    "DataProcessingError",
    "data_processing_error",
    500,
    "Data processing error",
);
pub const CONTENT_MODERATION_ERROR: KindSpec = KindSpec::new(
    "ContentModerationError",
    "content_moderation_error",
    400,
    "Content moderation error",
);
pub const AI_QUOTA_EXCEEDED: KindSpec = KindSpec::new(
    "AIQuotaExceededError",
    "ai_quota_exceeded",
    429,
    "AI computation quota exceeded",
);
pub const MODEL_EXECUTION_ERROR: KindSpec = KindSpec::new(
    "ModelExecutionError",
    "model_execution_error",
    500,
    "ML model execution error",
);
pub const PREDICTION_TIMEOUT: KindSpec = KindSpec::new(
    "PredictionTimeoutError",
    "prediction_timeout",
    504,
    "ML prediction request timeout",
);

/// Every AI kind, parents before children.
pub const AI_KINDS: [KindSpec; 9] = [
    ALGORITHM_ERROR,
    RECOMMENDATION_ERROR,
    FEED_PROCESSING_ERROR,
    AD_PERSONALIZATION_ERROR,
    DATA_PROCESSING_ERROR,
    CONTENT_MODERATION_ERROR,
    AI_QUOTA_EXCEEDED,
    MODEL_EXECUTION_ERROR,
    PREDICTION_TIMEOUT,
];

/// Kinds whose failures `degrade_gracefully` absorbs (with their sub-kinds).
const DEGRADABLE: [&str; 5] = [
    ALGORITHM_ERROR.code,
    MODEL_EXECUTION_ERROR.code,
    DATA_PROCESSING_ERROR.code,
    CONTENT_MODERATION_ERROR.code,
    AI_QUOTA_EXCEEDED.code,
];

/// The AI error extension module.
#[derive(Debug, Clone, Copy, Default)]
pub struct AiErrorExtension;

impl ErrorExtension for AiErrorExtension {
    fn name(&self) -> &'static str {
        "ai"
    }

    fn kinds(&self) -> Result<Vec<KindSpec>, ExtensionError> {
        Ok(AI_KINDS.to_vec())
    }
}

pub fn algorithm_error(algorithm_name: Option<&str>) -> AppError {
    AppError::extension(ALGORITHM_ERROR).with_optional_data("algorithm_name", algorithm_name)
}

/// `recommendation_type` is e.g. "user", "content" or "course".
pub fn recommendation_error(recommendation_type: Option<&str>) -> AppError {
    AppError::extension(RECOMMENDATION_ERROR)
        .with_optional_data("recommendation_type", recommendation_type)
}

/// `feed_type` is e.g. "main", "stories" or "suggested".
pub fn feed_processing_error(feed_type: Option<&str>) -> AppError {
    AppError::extension(FEED_PROCESSING_ERROR).with_optional_data("feed_type", feed_type)
}

pub fn ad_personalization_error(ad_type: Option<&str>) -> AppError {
    AppError::extension(AD_PERSONALIZATION_ERROR).with_optional_data("ad_type", ad_type)
}

pub fn data_processing_error(data_type: Option<&str>) -> AppError {
    AppError::extension(DATA_PROCESSING_ERROR).with_optional_data("data_type", data_type)
}

pub fn content_moderation_error(
    content_type: Option<&str>,
    moderation_reason: Option<&str>,
) -> AppError {
    AppError::extension(CONTENT_MODERATION_ERROR)
        .with_optional_data("content_type", content_type)
        .with_optional_data("moderation_reason", moderation_reason)
}

/// `reset_time` (seconds) also becomes the `Retry-After` header.
pub fn ai_quota_exceeded(quota_type: Option<&str>, reset_time: Option<u64>) -> AppError {
    let error = AppError::extension(AI_QUOTA_EXCEEDED)
        .with_optional_data("quota_type", quota_type)
        .with_optional_data("reset_time", reset_time);
    match reset_time {
        Some(seconds) => error.with_retry_after(seconds),
        None => error,
    }
}

pub fn model_execution_error(model_name: Option<&str>, error_type: Option<&str>) -> AppError {
    AppError::extension(MODEL_EXECUTION_ERROR)
        .with_optional_data("model_name", model_name)
        .with_optional_data("error_type", error_type)
}

pub fn prediction_timeout(model_name: Option<&str>, timeout_seconds: Option<u64>) -> AppError {
    AppError::extension(PREDICTION_TIMEOUT)
        .with_optional_data("model_name", model_name)
        .with_optional_data("timeout_seconds", timeout_seconds)
}

/// Codes of `spec` and its ancestors within the AI kinds.
fn lineage(spec: KindSpec) -> impl Iterator<Item = &'static str> {
    std::iter::successors(Some(spec), |s| {
        s.parent
            .and_then(|parent| AI_KINDS.iter().copied().find(|k| k.code == parent))
    })
    .map(|s| s.code)
}

/// Whether `error` belongs to one of the AI kinds.
pub fn is_ai_error(error: &AppError) -> bool {
    matches!(error.kind(), ErrorKind::Extension(spec) if AI_KINDS.contains(&spec))
}

fn is_degradable(error: &AppError) -> bool {
    match error.kind() {
        ErrorKind::Extension(spec) if AI_KINDS.contains(&spec) => {
            lineage(spec).any(|code| DEGRADABLE.contains(&code))
        }
        _ => false,
    }
}

/// Root AI kind of `error`, or its own code when it is not an AI error.
fn family(error: &AppError) -> &'static str {
    match error.kind() {
        ErrorKind::Extension(spec) => lineage(spec).last().unwrap_or(spec.code),
        kind => kind.code(),
    }
}

/// Quota exhaustion is expected under load and logs as a warning.
pub fn ai_log_level(error: &AppError) -> Level {
    if family(error) == AI_QUOTA_EXCEEDED.code {
        Level::WARN
    } else {
        Level::ERROR
    }
}

fn ai_log_label(error: &AppError) -> &'static str {
    match family(error) {
        code if code == ALGORITHM_ERROR.code || code == MODEL_EXECUTION_ERROR.code => {
            "AI algorithm error"
        }
        code if code == DATA_PROCESSING_ERROR.code => "Data processing error",
        _ => "Unhandled AI error",
    }
}

/// Structured context logged for an AI failure.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AiErrorContext {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub user_agent: Option<String>,
    pub path: String,
    pub method: String,
    pub error_type: &'static str,
    pub error_message: String,
}

/// Log an AI failure with its request context and return that context.
///
/// Quota exhaustion is logged as a warning, everything else as an error.
pub fn log_ai_error(ctx: &RequestContext, error: &AppError) -> AiErrorContext {
    let context = AiErrorContext {
        user_id: ctx.user_id.clone(),
        session_id: ctx.session_id.clone(),
        user_agent: ctx.user_agent.clone(),
        path: ctx.path.clone(),
        method: ctx.method.to_string(),
        error_type: error.kind().spec().name,
        error_message: error.to_string(),
    };

    if ai_log_level(error) == Level::WARN {
        tracing::warn!(
            user_id = context.user_id.as_deref(),
            session_id = context.session_id.as_deref(),
            user_agent = context.user_agent.as_deref(),
            path = %context.path,
            method = %context.method,
            error_type = context.error_type,
            "AI quota exceeded: {}",
            context.error_message
        );
    } else {
        tracing::error!(
            user_id = context.user_id.as_deref(),
            session_id = context.session_id.as_deref(),
            user_agent = context.user_agent.as_deref(),
            path = %context.path,
            method = %context.method,
            error_type = context.error_type,
            "{}: {}",
            ai_log_label(error),
            context.error_message
        );
    }

    context
}

/// Await an AI operation, substituting `fallback` when it fails with an
/// algorithm, model, data processing, moderation or quota error. Other
/// errors (including prediction timeouts) propagate unchanged.
pub async fn degrade_gracefully<T, F>(
    ctx: Option<&RequestContext>,
    operation: F,
    fallback: T,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match operation.await {
        Ok(value) => Ok(value),
        Err(error) if is_degradable(&error) => {
            match ctx {
                Some(ctx) => {
                    log_ai_error(ctx, &error);
                }
                None => tracing::error!(error = %error, "AI error (degraded gracefully)"),
            }
            Ok(fallback)
        }
        Err(error) => Err(error),
    }
}
