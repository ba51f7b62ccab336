//! Pulse CLI - KPI tracking dashboard
//!
//! Usage:
//!   pulse init                          Initialize database
//!   pulse import --metric 1 --file X    Import measurements from a workbook
//!   pulse status                        Show pillars and coverage
//!   pulse serve --port 3000             Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use commands::ConflictMode;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::Import {
            metric,
            file,
            rows,
            replace_all,
            keep_existing,
        } => {
            let db = commands::open_db(&cli.db)?;
            let mode = if replace_all {
                ConflictMode::ReplaceAll
            } else if keep_existing {
                ConflictMode::KeepExisting
            } else {
                ConflictMode::Ask
            };
            commands::cmd_import(&db, &cli.user, metric, file.as_deref(), &rows, mode)
        }
        Commands::Status => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_status(&db)
        }
        Commands::Pillars { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None | Some(PillarsAction::List) => commands::cmd_pillars_list(&db),
                Some(PillarsAction::Add {
                    name,
                    color,
                    icon,
                    order,
                }) => commands::cmd_pillars_add(
                    &db,
                    &name,
                    color.as_deref(),
                    icon.as_deref(),
                    order,
                ),
            }
        }
        Commands::Metrics { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None | Some(MetricsAction::List { pillar: None }) => {
                    commands::cmd_metrics_list(&db, None)
                }
                Some(MetricsAction::List { pillar }) => commands::cmd_metrics_list(&db, pillar),
                Some(MetricsAction::Add {
                    pillar,
                    title,
                    kind,
                }) => commands::cmd_metrics_add(&db, pillar, &title, &kind),
            }
        }
        Commands::Plans { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None | Some(PlansAction::List { pillar: None }) => {
                    commands::cmd_plans_list(&db, None)
                }
                Some(PlansAction::List { pillar }) => commands::cmd_plans_list(&db, pillar),
                Some(PlansAction::Add {
                    pillar,
                    title,
                    due,
                    status,
                }) => commands::cmd_plans_add(&db, pillar, &title, &due, &status),
                Some(PlansAction::SetStatus { id, status }) => {
                    commands::cmd_plans_set_status(&db, id, &status)
                }
            }
        }
        Commands::Users { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None | Some(UsersAction::List) => commands::cmd_users_list(&db),
                Some(UsersAction::Add { name, role }) => {
                    commands::cmd_users_add(&db, &name, &role)
                }
            }
        }
        Commands::Measurements {
            metric,
            from,
            to,
            period,
        } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_measurements_list(
                &db,
                metric,
                from.as_deref(),
                to.as_deref(),
                &period,
            )
        }
        Commands::Export {
            metric,
            output,
            template,
        } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_export(&db, metric, output.as_deref(), template)
        }
        Commands::Clear { metric, dates } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_measurements_clear(&db, metric, &dates)
        }
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(&cli.db, &host, port, no_auth).await,
    }
}
