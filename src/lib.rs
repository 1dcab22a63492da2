//! # Lyo API Error Handling
//!
//! Classifies every failure that reaches the HTTP boundary and renders it
//! as a uniform JSON error envelope:
//! - built-in application error kinds plus kinds contributed by extensions
//! - protocol errors raised by routing and request parsing
//! - per-field validation failures
//! - unexpected errors and panics
//!
//! ## Architecture
//!
//! - **Application Layer**: error registry, dispatch table, translation and monitoring seams
//! - **Extensions**: optional packages of extra error kinds (AI components)
//! - **Infrastructure Layer**: Prometheus-backed monitoring
//! - **Presentation Layer**: middleware, extractors and HTTP handlers
//!
//! ## Module Structure
//!
//! ```text
//! lyo_api/
//! +-- config/         Configuration management
//! +-- application/    Registry, dispatch, translator, monitoring
//! +-- extensions/     Extension error kinds
//! +-- infrastructure/ Metrics
//! +-- presentation/   HTTP routes and middleware
//! +-- shared/         Error types, validation failures, languages
//! ```

// Configuration module
pub mod config;

// Application layer - Error registry and dispatch
pub mod application;

// Extension error kinds
pub mod extensions;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP handlers and middleware
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
