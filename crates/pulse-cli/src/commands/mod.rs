//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `status` - Init and status commands
//! - `import` - Workbook/manual import with interactive reconciliation
//! - `measurements` - Measurement listing with period labels
//! - `export` - CSV export and import templates
//! - `pillars` - Pillar management
//! - `metrics` - Metric management
//! - `plans` - Action plan management
//! - `users` - User and role management
//! - `serve` - Web server command

pub mod export;
pub mod import;
pub mod measurements;
pub mod metrics;
pub mod pillars;
pub mod plans;
pub mod serve;
pub mod status;
pub mod users;

// Re-export command functions for main.rs
pub use export::*;
pub use import::*;
pub use measurements::*;
pub use metrics::*;
pub use pillars::*;
pub use plans::*;
pub use serve::*;
pub use status::*;
pub use users::*;

use std::path::Path;

use anyhow::{Context, Result};
use pulse_core::db::Database;

/// Open (and migrate) the database at the given path
pub fn open_db(path: &Path) -> Result<Database> {
    Database::new(&path.to_string_lossy())
        .with_context(|| format!("Failed to open database: {}", path.display()))
}
