//! Pillar operations

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::Pillar;

fn pillar_from_sql(row: &rusqlite::Row<'_>) -> rusqlite::Result<Pillar> {
    let created_at_str: String = row.get(5)?;
    Ok(Pillar {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        icon: row.get(3)?,
        display_order: row.get(4)?,
        created_at: parse_datetime(&created_at_str),
    })
}

impl Database {
    /// Create or get a pillar by name
    pub fn upsert_pillar(
        &self,
        name: &str,
        color: Option<&str>,
        icon: Option<&str>,
        display_order: i64,
    ) -> Result<i64> {
        let conn = self.conn()?;

        // Try to find existing pillar
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM pillars WHERE name = ?",
                params![name],
                |row| row.get(0),
            )
            .ok();

        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO pillars (name, color, icon, display_order) VALUES (?, ?, ?, ?)",
            params![name, color, icon, display_order],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// List all pillars in display order
    pub fn list_pillars(&self) -> Result<Vec<Pillar>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, color, icon, display_order, created_at
             FROM pillars ORDER BY display_order, name",
        )?;

        let pillars = stmt
            .query_map([], pillar_from_sql)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(pillars)
    }

    /// Get a pillar by ID
    pub fn get_pillar(&self, id: i64) -> Result<Option<Pillar>> {
        let conn = self.conn()?;
        let pillar = conn
            .query_row(
                "SELECT id, name, color, icon, display_order, created_at
                 FROM pillars WHERE id = ?",
                params![id],
                pillar_from_sql,
            )
            .ok();

        Ok(pillar)
    }

    /// Delete a pillar; its metrics, measurements, and action plans cascade
    pub fn delete_pillar(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM pillars WHERE id = ?", params![id])?;
        Ok(())
    }
}
