//! Application Layer
//!
//! Error registry, dispatch and the collaborators they depend on
//! (message translation, error monitoring).

pub mod dispatch;
pub mod monitoring;
pub mod registry;
pub mod translator;
