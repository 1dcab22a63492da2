//! HTTP API
//!
//! Routes, handlers and extractors.

pub mod extractors;
pub mod handlers;
pub mod routes;

pub use extractors::ValidatedJson;
