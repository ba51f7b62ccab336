//! Pulse Core Library
//!
//! Shared functionality for the Pulse KPI tracker:
//! - Database access and migrations
//! - Spreadsheet workbook reading and row normalization
//! - Internal duplicate detection and resolution
//! - External conflict detection against stored measurements
//! - The import reconciliation state machine
//! - Period bucketing and goal status helpers
//! - CSV export and import templates

pub mod conflict;
pub mod db;
pub mod dedupe;
pub mod error;
pub mod export;
pub mod import;
pub mod models;
pub mod periods;
pub mod reconcile;
pub mod xlsx;

pub use conflict::ConflictSet;
pub use db::Database;
pub use dedupe::DuplicateGroup;
pub use error::{Error, Result};
pub use import::{NormalizedBatch, RawRow, RawValue, SkippedRow};
pub use models::{
    ActionPlan, ActionPlanStatus, GoalStatus, MeasurementRow, Metric, MetricType, Pillar, Role,
    TimePeriod, User,
};
pub use reconcile::{ImportOutcome, ImportSession};
