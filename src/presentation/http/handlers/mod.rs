//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod errors;
pub mod health;
