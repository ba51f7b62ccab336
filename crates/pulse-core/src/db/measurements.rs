//! Measurement row operations
//!
//! This is the storage side of the import pipeline's contract: existence
//! checks by date, full-row fetches for conflict comparison, and the final
//! batched upsert keyed on `(metric_id, date)`.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::{parse_date, Database};
use crate::error::Result;
use crate::models::MeasurementRow;

fn row_from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<MeasurementRow> {
    Ok(MeasurementRow {
        date: parse_date(&row.get::<_, String>(0)?),
        value: row.get(1)?,
        goal: row.get(2)?,
        meet_goal: row.get(3)?,
        behind_goal: row.get(4)?,
        at_risk: row.get(5)?,
    })
}

impl Database {
    /// Dates that already have a measurement for this metric (existence only)
    pub fn measurement_dates(&self, metric_id: i64) -> Result<Vec<NaiveDate>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT date FROM measurements WHERE metric_id = ?1 ORDER BY date")?;
        let dates = stmt
            .query_map(params![metric_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(dates.iter().map(|s| parse_date(s)).collect())
    }

    /// Full rows for a set of dates, for side-by-side conflict comparison
    pub fn measurements_for_dates(
        &self,
        metric_id: i64,
        dates: &[NaiveDate],
    ) -> Result<Vec<MeasurementRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT date, value, goal, meet_goal, behind_goal, at_risk
             FROM measurements WHERE metric_id = ?1 AND date = ?2",
        )?;

        let mut rows = Vec::with_capacity(dates.len());
        for date in dates {
            let found = stmt
                .query_row(params![metric_id, date.to_string()], row_from_sql)
                .optional()?;
            if let Some(row) = found {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// Write the final reconciled row set in one transaction
    ///
    /// Upserts on `(metric_id, date)`: exactly the given rows are written,
    /// rows for any other date are untouched. The batch must already be
    /// unique per date; the unique constraint backstops that invariant.
    pub fn upsert_measurements(
        &self,
        metric_id: i64,
        rows: &[MeasurementRow],
    ) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO measurements
                     (metric_id, date, value, goal, meet_goal, behind_goal, at_risk)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(metric_id, date) DO UPDATE SET
                     value = excluded.value,
                     goal = excluded.goal,
                     meet_goal = excluded.meet_goal,
                     behind_goal = excluded.behind_goal,
                     at_risk = excluded.at_risk",
            )?;
            for row in rows {
                stmt.execute(params![
                    metric_id,
                    row.date.to_string(),
                    row.value,
                    row.goal,
                    row.meet_goal,
                    row.behind_goal,
                    row.at_risk,
                ])?;
            }
        }
        tx.commit()?;

        debug!(metric_id, rows = rows.len(), "Upserted measurements");
        Ok(rows.len())
    }

    /// Remove the rows for the given dates
    pub fn delete_measurements_for_dates(
        &self,
        metric_id: i64,
        dates: &[NaiveDate],
    ) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut deleted = 0;
        {
            let mut stmt =
                tx.prepare("DELETE FROM measurements WHERE metric_id = ?1 AND date = ?2")?;
            for date in dates {
                deleted += stmt.execute(params![metric_id, date.to_string()])?;
            }
        }
        tx.commit()?;
        Ok(deleted)
    }

    /// Measurements for a metric, optionally bounded by an inclusive date range
    pub fn list_measurements(
        &self,
        metric_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<MeasurementRow>> {
        let conn = self.conn()?;

        let mut conditions = vec!["metric_id = ?1".to_string()];
        let mut sql_params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(metric_id)];

        if let Some(from) = from {
            sql_params.push(Box::new(from.to_string()));
            conditions.push(format!("date >= ?{}", sql_params.len()));
        }
        if let Some(to) = to {
            sql_params.push(Box::new(to.to_string()));
            conditions.push(format!("date <= ?{}", sql_params.len()));
        }

        let sql = format!(
            "SELECT date, value, goal, meet_goal, behind_goal, at_risk
             FROM measurements WHERE {} ORDER BY date",
            conditions.join(" AND ")
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            sql_params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt
            .query_map(params_refs.as_slice(), row_from_sql)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
