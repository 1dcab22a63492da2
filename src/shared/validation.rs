//! Validation Utilities
//!
//! Structured per-field validation failures and their conversion from
//! `validator` reports.

use serde::Serialize;
use validator::{ValidationErrors, ValidationErrorsKind};

/// One segment of a field path: an object key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LocSegment {
    Field(String),
    Index(usize),
}

impl From<&str> for LocSegment {
    fn from(field: &str) -> Self {
        LocSegment::Field(field.to_string())
    }
}

impl From<usize> for LocSegment {
    fn from(index: usize) -> Self {
        LocSegment::Index(index)
    }
}

/// Field-level validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub loc: Vec<LocSegment>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldFailure {
    pub fn new(loc: Vec<LocSegment>, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            kind: kind.into(),
        }
    }
}

/// Ordered list of field failures reported for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFailure {
    errors: Vec<FieldFailure>,
}

impl ValidationFailure {
    pub fn new(errors: Vec<FieldFailure>) -> Self {
        Self { errors }
    }

    pub fn push(&mut self, failure: FieldFailure) {
        self.errors.push(failure);
    }

    pub fn errors(&self) -> &[FieldFailure] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Flatten a `validator` report under `prefix` (e.g. `["body"]`).
    ///
    /// `validator` keeps fields in a hash map, so fields are visited in name
    /// order; failures of a single field keep the validator's order.
    pub fn from_validation_errors(prefix: &[LocSegment], errors: &ValidationErrors) -> Self {
        let mut failure = Self::default();
        collect(prefix.to_vec(), errors, &mut failure.errors);
        failure
    }
}

fn collect(prefix: Vec<LocSegment>, errors: &ValidationErrors, out: &mut Vec<FieldFailure>) {
    let mut fields: Vec<(String, &ValidationErrorsKind)> = errors
        .errors()
        .iter()
        .map(|(field, kind)| (field.to_string(), kind))
        .collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    for (field, kind) in fields {
        let mut loc = prefix.clone();
        // `__all__` carries struct-level (schema) failures
        if field != "__all__" {
            loc.push(LocSegment::Field(field));
        }
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.extend(errs.iter().map(|e| {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| default_message(&e.code).to_string());
                    FieldFailure::new(loc.clone(), msg, e.code.to_string())
                }));
            }
            ValidationErrorsKind::Struct(nested) => collect(loc, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    let mut item_loc = loc.clone();
                    item_loc.push(LocSegment::Index(*index));
                    collect(item_loc, nested, out);
                }
            }
        }
    }
}

fn default_message(code: &str) -> &'static str {
    match code {
        "required" => "Field required",
        "email" => "Value is not a valid email address",
        "url" => "Value is not a valid URL",
        "length" => "Value has an invalid length",
        "range" => "Value is out of range",
        "regex" => "Value does not match the expected pattern",
        "must_match" => "Values do not match",
        _ => "Invalid value",
    }
}

/// Convert validation errors of a JSON body to a `ValidationFailure`
pub fn validation_failure(errors: &ValidationErrors) -> ValidationFailure {
    ValidationFailure::from_validation_errors(&[LocSegment::from("body")], errors)
}
