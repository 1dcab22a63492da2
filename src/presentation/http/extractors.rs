//! Custom Extractors
//!
//! Axum extractors for request parsing.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::shared::error::{Failure, ProtocolError};
use crate::shared::validation::{validation_failure, FieldFailure, LocSegment, ValidationFailure};

/// JSON body that has passed its `validator` rules.
///
/// A body that is valid JSON but does not fit `T` is a validation failure on
/// `["body"]`; rule violations are reported per field. Anything else the
/// JSON extractor rejects (wrong content type, syntax errors) is a protocol
/// failure with the rejection's own status.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Failure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        value
            .validate()
            .map_err(|errors| Failure::from(validation_failure(&errors)))?;

        Ok(Self(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> Failure {
    match rejection {
        JsonRejection::JsonDataError(err) => ValidationFailure::new(vec![FieldFailure::new(
            vec![LocSegment::from("body")],
            err.body_text(),
            "value_error",
        )])
        .into(),
        other => ProtocolError::new(other.status(), other.body_text()).into(),
    }
}
