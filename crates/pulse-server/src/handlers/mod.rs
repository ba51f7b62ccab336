//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod action_plans;
pub mod import;
pub mod measurements;
pub mod metrics;
pub mod pillars;

// Re-export all handlers for use in router
pub use action_plans::*;
pub use import::*;
pub use measurements::*;
pub use metrics::*;
pub use pillars::*;
