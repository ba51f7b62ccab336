//! Action plan operations

use chrono::NaiveDate;
use rusqlite::params;
use serde::Serialize;

use super::{parse_date, parse_datetime, Database};
use crate::error::Result;
use crate::models::{ActionPlan, ActionPlanStatus};

/// Per-status counts for a pillar's action plans
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ActionPlanCounts {
    pub open: i64,
    pub pending: i64,
    pub overdue: i64,
}

fn plan_from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<ActionPlan> {
    let due_date_str: String = row.get(3)?;
    let status_str: String = row.get(4)?;
    let created_at_str: String = row.get(5)?;
    Ok(ActionPlan {
        id: row.get(0)?,
        pillar_id: row.get(1)?,
        title: row.get(2)?,
        due_date: parse_date(&due_date_str),
        status: status_str.parse().unwrap_or_default(),
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Create an action plan for a pillar
    pub fn create_action_plan(
        &self,
        pillar_id: i64,
        title: &str,
        due_date: NaiveDate,
        status: ActionPlanStatus,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO action_plans (pillar_id, title, due_date, status) VALUES (?, ?, ?, ?)",
            params![pillar_id, title, due_date.to_string(), status.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List action plans, optionally restricted to one pillar, due-date order
    pub fn list_action_plans(&self, pillar_id: Option<i64>) -> Result<Vec<ActionPlan>> {
        let conn = self.conn()?;

        let plans = match pillar_id {
            Some(pid) => {
                let mut stmt = conn.prepare(
                    "SELECT id, pillar_id, title, due_date, status, created_at
                     FROM action_plans WHERE pillar_id = ? ORDER BY due_date",
                )?;
                let rows = stmt.query_map(params![pid], plan_from_sql)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, pillar_id, title, due_date, status, created_at
                     FROM action_plans ORDER BY due_date",
                )?;
                let rows = stmt.query_map([], plan_from_sql)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(plans)
    }

    /// Update an action plan's status
    pub fn update_action_plan_status(&self, id: i64, status: ActionPlanStatus) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE action_plans SET status = ? WHERE id = ?",
            params![status.as_str(), id],
        )?;
        Ok(())
    }

    /// Delete an action plan
    pub fn delete_action_plan(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM action_plans WHERE id = ?", params![id])?;
        Ok(())
    }

    /// Status counts for a pillar's action plans
    pub fn action_plan_counts(&self, pillar_id: i64) -> Result<ActionPlanCounts> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT status, COUNT(*) FROM action_plans WHERE pillar_id = ? GROUP BY status",
        )?;

        let mut counts = ActionPlanCounts::default();
        let rows = stmt.query_map(params![pillar_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (status, count) = row?;
            match status.parse::<ActionPlanStatus>() {
                Ok(ActionPlanStatus::Open) => counts.open = count,
                Ok(ActionPlanStatus::Pending) => counts.pending = count,
                Ok(ActionPlanStatus::Overdue) => counts.overdue = count,
                Err(_) => {}
            }
        }

        Ok(counts)
    }
}
