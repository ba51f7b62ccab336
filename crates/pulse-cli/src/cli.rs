//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Pulse - Track KPI pillars, metrics, and measurements
#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Self-hosted KPI tracking dashboard", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "pulse.db", global = true)]
    pub db: PathBuf,

    /// Acting user; write commands check this user's role
    #[arg(long, default_value = "admin", global = true)]
    pub user: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed the default admin user
    Init,

    /// Import measurements from a workbook or inline rows
    Import {
        /// Metric ID to import into
        #[arg(short, long)]
        metric: i64,

        /// Workbook to import (.xlsx or .xls)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Inline row as DATE=VALUE (repeatable; manual entry without a file)
        #[arg(long = "set", value_name = "DATE=VALUE")]
        rows: Vec<String>,

        /// Resolve storage conflicts by replacing all stored rows
        #[arg(long, conflicts_with = "keep_existing")]
        replace_all: bool,

        /// Resolve storage conflicts by keeping all stored rows
        #[arg(long)]
        keep_existing: bool,
    },

    /// Show pillars, metrics, and measurement coverage
    Status,

    /// Manage pillars
    Pillars {
        #[command(subcommand)]
        action: Option<PillarsAction>,
    },

    /// Manage metrics
    Metrics {
        #[command(subcommand)]
        action: Option<MetricsAction>,
    },

    /// Manage action plans
    Plans {
        #[command(subcommand)]
        action: Option<PlansAction>,
    },

    /// Manage users and their roles
    Users {
        #[command(subcommand)]
        action: Option<UsersAction>,
    },

    /// List measurements for a metric with period labels and goal status
    Measurements {
        /// Metric ID
        #[arg(short, long)]
        metric: i64,

        /// Start date (inclusive, YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (inclusive, YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Period labels: daily, weekly, monthly
        #[arg(short, long, default_value = "weekly")]
        period: String,
    },

    /// Export a metric's measurements to CSV
    Export {
        /// Metric ID
        #[arg(short, long)]
        metric: i64,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit an empty import template instead of data
        #[arg(long)]
        template: bool,
    },

    /// Delete stored measurements for specific dates
    Clear {
        /// Metric ID
        #[arg(short, long)]
        metric: i64,

        /// Dates to remove (YYYY-MM-DD)
        #[arg(required = true)]
        dates: Vec<String>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a
        /// network. By default the server requires an API key.
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
pub enum PillarsAction {
    /// List pillars
    List,

    /// Add a pillar
    Add {
        /// Pillar name
        name: String,

        /// Display color (hex)
        #[arg(long)]
        color: Option<String>,

        /// Short icon label
        #[arg(long)]
        icon: Option<String>,

        /// Display order (lower sorts first)
        #[arg(long, default_value = "0")]
        order: i64,
    },
}

#[derive(Subcommand)]
pub enum MetricsAction {
    /// List metrics
    List {
        /// Restrict to one pillar
        #[arg(long)]
        pillar: Option<i64>,
    },

    /// Add a metric to a pillar
    Add {
        /// Pillar ID
        #[arg(long)]
        pillar: i64,

        /// Metric title
        title: String,

        /// Metric type: count, percent, duration
        #[arg(long, default_value = "count")]
        kind: String,
    },
}

#[derive(Subcommand)]
pub enum PlansAction {
    /// List action plans
    List {
        /// Restrict to one pillar
        #[arg(long)]
        pillar: Option<i64>,
    },

    /// Add an action plan
    Add {
        /// Pillar ID
        #[arg(long)]
        pillar: i64,

        /// Plan title
        title: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: String,

        /// Status: open, pending, overdue
        #[arg(long, default_value = "open")]
        status: String,
    },

    /// Update a plan's status
    SetStatus {
        /// Plan ID
        id: i64,

        /// New status: open, pending, overdue
        status: String,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List users
    List,

    /// Add a user or update their role
    Add {
        /// User name
        name: String,

        /// Role: admin, viewer
        #[arg(long, default_value = "viewer")]
        role: String,
    },
}
