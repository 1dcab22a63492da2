//! API Integration Tests

mod ai_tests;
mod catalog_tests;
mod dispatch_tests;
mod health_tests;
