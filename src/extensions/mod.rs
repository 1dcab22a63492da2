//! Error Extensions
//!
//! Optional packages contributing error kinds to the registry at startup.

pub mod ai;

pub use ai::AiErrorExtension;
