//! Infrastructure Layer
//!
//! Implementations of application collaborators backed by external crates:
//! - Prometheus metrics and the error monitor built on them

pub mod metrics;
