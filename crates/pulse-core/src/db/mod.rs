//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `pillars` - Pillar (category) operations
//! - `metrics` - Metric CRUD
//! - `measurements` - Dated measurement rows and the import write contract
//! - `action_plans` - Action plan tracking
//! - `users` - Users and write roles

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::Result;

mod action_plans;
mod measurements;
mod metrics;
mod pillars;
mod users;

#[cfg(test)]
mod tests;

pub use action_plans::ActionPlanCounts;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a stored "YYYY-MM-DD" date column
pub(crate) fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_default()
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool and run migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` because every pooled
    /// connection to `:memory:` would open its own empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!(
            "{}/pulse_test_{}_{}.db",
            std::env::temp_dir().display(),
            std::process::id(),
            id
        );

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: better concurrency, readers don't block writers
            PRAGMA journal_mode = WAL;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            -- Pillars (metric categories, e.g. Safety, Quality)
            CREATE TABLE IF NOT EXISTS pillars (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                color TEXT,
                icon TEXT,
                display_order INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Metrics (KPIs belonging to a pillar)
            CREATE TABLE IF NOT EXISTS metrics (
                id INTEGER PRIMARY KEY,
                pillar_id INTEGER NOT NULL REFERENCES pillars(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                metric_type TEXT NOT NULL DEFAULT 'count',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_metrics_pillar ON metrics(pillar_id);

            -- Measurements: one row per metric per calendar date.
            -- The UNIQUE constraint is the upsert conflict target; the import
            -- pipeline guarantees batches are unique per date before writing.
            CREATE TABLE IF NOT EXISTS measurements (
                id INTEGER PRIMARY KEY,
                metric_id INTEGER NOT NULL REFERENCES metrics(id) ON DELETE CASCADE,
                date TEXT NOT NULL,
                value REAL NOT NULL DEFAULT 0,
                goal REAL,
                meet_goal REAL,
                behind_goal REAL,
                at_risk REAL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(metric_id, date)
            );

            CREATE INDEX IF NOT EXISTS idx_measurements_metric_date
                ON measurements(metric_id, date);

            -- Action plans linked to a pillar
            CREATE TABLE IF NOT EXISTS action_plans (
                id INTEGER PRIMARY KEY,
                pillar_id INTEGER NOT NULL REFERENCES pillars(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                due_date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'open',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_action_plans_pillar ON action_plans(pillar_id);

            -- Users and their write roles
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL DEFAULT 'viewer',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;

        Ok(())
    }
}
