//! Metric operations

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{Metric, MetricType};

fn metric_from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Metric> {
    let type_str: String = row.get(3)?;
    let created_at_str: String = row.get(4)?;
    Ok(Metric {
        id: row.get(0)?,
        pillar_id: row.get(1)?,
        title: row.get(2)?,
        metric_type: type_str.parse().unwrap_or_default(),
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Create a metric under a pillar
    pub fn create_metric(
        &self,
        pillar_id: i64,
        title: &str,
        metric_type: MetricType,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO metrics (pillar_id, title, metric_type) VALUES (?, ?, ?)",
            params![pillar_id, title, metric_type.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List metrics, optionally restricted to one pillar
    pub fn list_metrics(&self, pillar_id: Option<i64>) -> Result<Vec<Metric>> {
        let conn = self.conn()?;

        let metrics = match pillar_id {
            Some(pid) => {
                let mut stmt = conn.prepare(
                    "SELECT id, pillar_id, title, metric_type, created_at
                     FROM metrics WHERE pillar_id = ? ORDER BY title",
                )?;
                let rows = stmt.query_map(params![pid], metric_from_sql)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, pillar_id, title, metric_type, created_at
                     FROM metrics ORDER BY pillar_id, title",
                )?;
                let rows = stmt.query_map([], metric_from_sql)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(metrics)
    }

    /// Get a metric by ID
    pub fn get_metric(&self, id: i64) -> Result<Option<Metric>> {
        let conn = self.conn()?;
        let metric = conn
            .query_row(
                "SELECT id, pillar_id, title, metric_type, created_at
                 FROM metrics WHERE id = ?",
                params![id],
                metric_from_sql,
            )
            .ok();

        Ok(metric)
    }

    /// Update a metric's title and type
    pub fn update_metric(&self, id: i64, title: &str, metric_type: MetricType) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE metrics SET title = ?, metric_type = ? WHERE id = ?",
            params![title, metric_type.as_str(), id],
        )?;
        Ok(())
    }

    /// Delete a metric and its measurements
    pub fn delete_metric(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM measurements WHERE metric_id = ?",
            params![id],
        )?;
        conn.execute("DELETE FROM metrics WHERE id = ?", params![id])?;
        Ok(())
    }
}
