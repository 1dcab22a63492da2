//! Middleware
//!
//! Tower middleware for request processing.

pub mod cors;
pub mod error_dispatch;
pub mod logging;
pub mod request_id;

pub use error_dispatch::{dispatch_errors, panic_response, with_error_handling};
pub use request_id::{request_id, RequestId};
