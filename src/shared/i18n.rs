//! Language Negotiation
//!
//! Supported languages and per-request language selection.

use serde::{Deserialize, Serialize};

/// Supported language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

pub const SUPPORTED_LANGUAGES: [Language; 11] = [
    Language { code: "en-US", name: "English (US)" },
    Language { code: "es-ES", name: "Spanish (Spain)" },
    Language { code: "fr-FR", name: "French (France)" },
    Language { code: "de-DE", name: "German (Germany)" },
    Language { code: "it-IT", name: "Italian (Italy)" },
    Language { code: "ja-JP", name: "Japanese (Japan)" },
    Language { code: "ko-KR", name: "Korean (Korea)" },
    Language { code: "pt-BR", name: "Portuguese (Brazil)" },
    Language { code: "ru-RU", name: "Russian (Russia)" },
    Language { code: "zh-CN", name: "Chinese (Simplified)" },
    Language { code: "zh-TW", name: "Chinese (Traditional)" },
];

pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Resolve a language tag to a supported code.
///
/// Exact matches win (case-insensitive); otherwise the primary subtag picks
/// the first supported variant, so `es` and `es-MX` both resolve to `es-ES`.
pub fn resolve(tag: &str) -> Option<&'static str> {
    let tag = tag.trim();
    if tag.is_empty() || tag == "*" {
        return None;
    }
    if let Some(lang) = SUPPORTED_LANGUAGES
        .iter()
        .find(|l| l.code.eq_ignore_ascii_case(tag))
    {
        return Some(lang.code);
    }
    let primary = tag.split(['-', '_']).next()?;
    SUPPORTED_LANGUAGES
        .iter()
        .find(|l| {
            l.code
                .split('-')
                .next()
                .is_some_and(|p| p.eq_ignore_ascii_case(primary))
        })
        .map(|l| l.code)
}

pub fn is_supported(tag: &str) -> bool {
    resolve(tag).is_some()
}

/// Pick the response language for a request.
///
/// Order: the `lang` query parameter, then each `Accept-Language` entry in
/// the order sent (quality values are not weighed), then `default`.
pub fn negotiate<'a>(
    query_lang: Option<&str>,
    accept_language: Option<&str>,
    default: &'a str,
) -> &'a str {
    if let Some(code) = query_lang.and_then(resolve) {
        return code;
    }
    accept_language
        .into_iter()
        .flat_map(|header| header.split(','))
        .filter_map(|entry| entry.split(';').next())
        .find_map(resolve)
        .unwrap_or(default)
}

/// The `lang` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}
