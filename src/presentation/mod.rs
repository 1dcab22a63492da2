//! Presentation Layer
//!
//! HTTP routes and the middleware rendering their failures.

pub mod http;
pub mod middleware;
