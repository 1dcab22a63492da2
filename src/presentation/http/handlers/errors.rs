//! Error Catalog Handlers
//!
//! Lets clients discover the error codes this server can answer with.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::application::registry::KindEntry;
use crate::shared::error::AppError;
use crate::shared::i18n::{Language, SUPPORTED_LANGUAGES};
use crate::startup::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorCatalogResponse {
    pub kinds: Vec<KindEntry>,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub default: String,
    pub languages: Vec<Language>,
}

/// List every registered error kind
pub async fn list_error_kinds(State(state): State<AppState>) -> Json<ErrorCatalogResponse> {
    Json(ErrorCatalogResponse {
        kinds: state.registry.entries(),
    })
}

/// Get a single error kind by its code
pub async fn get_error_kind(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<KindEntry>, AppError> {
    state
        .registry
        .entries()
        .into_iter()
        .find(|entry| entry.code == code)
        .map(Json)
        .ok_or_else(|| {
            AppError::not_found("Error kind not found").with_data("kind", code.clone())
        })
}

/// List the languages error messages can be negotiated in
pub async fn list_languages(State(state): State<AppState>) -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        default: state.settings.i18n.default_language.clone(),
        languages: SUPPORTED_LANGUAGES.to_vec(),
    })
}
