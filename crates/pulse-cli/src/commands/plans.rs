//! Action plan management commands

use anyhow::{Context, Result};
use chrono::NaiveDate;
use pulse_core::db::Database;
use pulse_core::models::ActionPlanStatus;

pub fn cmd_plans_list(db: &Database, pillar_id: Option<i64>) -> Result<()> {
    let plans = db.list_action_plans(pillar_id)?;
    if plans.is_empty() {
        println!("No action plans.");
        return Ok(());
    }

    for plan in plans {
        println!(
            "[{}] {} (due {}, {}, pillar {})",
            plan.id, plan.title, plan.due_date, plan.status, plan.pillar_id
        );
    }
    Ok(())
}

pub fn cmd_plans_add(
    db: &Database,
    pillar_id: i64,
    title: &str,
    due: &str,
    status: &str,
) -> Result<()> {
    db.get_pillar(pillar_id)?
        .with_context(|| format!("Pillar {} not found", pillar_id))?;

    let due_date = NaiveDate::parse_from_str(due, "%Y-%m-%d")
        .context("Invalid --due date format (use YYYY-MM-DD)")?;
    let status: ActionPlanStatus = status
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("Expected one of: open, pending, overdue")?;

    let id = db.create_action_plan(pillar_id, title, due_date, status)?;
    println!("✅ Action plan '{}' (id {})", title, id);
    Ok(())
}

pub fn cmd_plans_set_status(db: &Database, id: i64, status: &str) -> Result<()> {
    let status: ActionPlanStatus = status
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("Expected one of: open, pending, overdue")?;

    db.update_action_plan_status(id, status)?;
    println!("✅ Plan {} is now {}", id, status);
    Ok(())
}
