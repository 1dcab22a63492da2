//! Shared Utilities
//!
//! Error types, validation failures and language negotiation used across all layers.

pub mod error;
pub mod i18n;
pub mod validation;
