//! Init and status commands

use std::path::Path;

use anyhow::Result;
use pulse_core::db::Database;
use pulse_core::models::Role;

use super::open_db;

/// Initialize the database and seed the default admin user
pub fn cmd_init(db_path: &Path) -> Result<()> {
    let db = open_db(db_path)?;
    db.upsert_user("admin", Role::Admin)?;

    println!("✅ Database initialized at {}", db_path.display());
    println!("   Seeded user 'admin' with the admin role (select with --user)");
    Ok(())
}

/// Show pillars, their metrics, and measurement coverage
pub fn cmd_status(db: &Database) -> Result<()> {
    let pillars = db.list_pillars()?;
    if pillars.is_empty() {
        println!("No pillars yet. Create one with: pulse pillars add <name>");
        return Ok(());
    }

    for pillar in pillars {
        let counts = db.action_plan_counts(pillar.id)?;
        println!(
            "📊 [{}] {} (plans: {} open, {} pending, {} overdue)",
            pillar.id, pillar.name, counts.open, counts.pending, counts.overdue
        );

        let metrics = db.list_metrics(Some(pillar.id))?;
        if metrics.is_empty() {
            println!("   (no metrics)");
            continue;
        }
        for metric in metrics {
            let dates = db.measurement_dates(metric.id)?;
            let coverage = match (dates.first(), dates.last()) {
                (Some(first), Some(last)) => {
                    format!("{} rows, {} to {}", dates.len(), first, last)
                }
                _ => "no data".to_string(),
            };
            println!(
                "   [{}] {} ({}) - {}",
                metric.id, metric.title, metric.metric_type, coverage
            );
        }
    }

    Ok(())
}
