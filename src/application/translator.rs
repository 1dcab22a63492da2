//! Response Translation
//!
//! Localizes user-facing error messages for the negotiated request language.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::shared::i18n::SUPPORTED_LANGUAGES;

#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    #[error("No catalog loaded for language {0}")]
    UnknownLanguage(String),

    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Maps a message key to its text in a given language.
#[cfg_attr(test, mockall::automock)]
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str, language: &str) -> Result<String, TranslationError>;
}

/// Returns every key unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, key: &str, _language: &str) -> Result<String, TranslationError> {
        Ok(key.to_string())
    }
}

/// Translator backed by one JSON object per language (`<dir>/<code>.json`),
/// mapping source messages to their translations.
#[derive(Debug, Clone, Default)]
pub struct CatalogTranslator {
    catalogs: HashMap<String, HashMap<String, String>>,
    default_language: String,
}

impl CatalogTranslator {
    /// Build from in-memory catalogs.
    pub fn new(
        catalogs: HashMap<String, HashMap<String, String>>,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            catalogs,
            default_language: default_language.into(),
        }
    }

    /// Load the catalog of every supported language present in `dir`.
    /// Missing files are skipped; unreadable or malformed ones are errors.
    pub fn load(dir: &Path, default_language: &str) -> Result<Self, TranslationError> {
        let mut catalogs = HashMap::new();
        for language in SUPPORTED_LANGUAGES {
            let path = dir.join(format!("{}.json", language.code));
            if !path.exists() {
                continue;
            }
            let raw = std::fs::read_to_string(&path).map_err(|source| TranslationError::Io {
                path: path.clone(),
                source,
            })?;
            let catalog: HashMap<String, String> = serde_json::from_str(&raw)
                .map_err(|source| TranslationError::Parse {
                    path: path.clone(),
                    source,
                })?;
            tracing::debug!(language = language.code, entries = catalog.len(), "Catalog loaded");
            catalogs.insert(language.code.to_string(), catalog);
        }
        Ok(Self::new(catalogs, default_language))
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(String::as_str)
    }
}

impl Translator for CatalogTranslator {
    fn translate(&self, key: &str, language: &str) -> Result<String, TranslationError> {
        // The default language is the source language and needs no catalog
        if language == self.default_language {
            return Ok(self
                .catalogs
                .get(language)
                .and_then(|c| c.get(key))
                .cloned()
                .unwrap_or_else(|| key.to_string()));
        }
        let catalog = self
            .catalogs
            .get(language)
            .ok_or_else(|| TranslationError::UnknownLanguage(language.to_string()))?;
        Ok(catalog.get(key).cloned().unwrap_or_else(|| key.to_string()))
    }
}
