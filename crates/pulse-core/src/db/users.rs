//! User and role operations

use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{Role, User};

impl Database {
    /// Create a user or update their role
    pub fn upsert_user(&self, name: &str, role: Role) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (name, role) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET role = excluded.role",
            params![name, role.as_str()],
        )?;

        let id = conn.query_row(
            "SELECT id FROM users WHERE name = ?",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Resolve a user's role; unknown users have no role
    pub fn role_for_user(&self, name: &str) -> Result<Option<Role>> {
        let conn = self.conn()?;
        let role: Option<String> = conn
            .query_row(
                "SELECT role FROM users WHERE name = ?",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        Ok(role.and_then(|s| s.parse().ok()))
    }

    /// List all users
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, role, created_at FROM users ORDER BY name")?;

        let users = stmt
            .query_map([], |row| {
                let role_str: String = row.get(2)?;
                let created_at_str: String = row.get(3)?;
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    role: role_str.parse().unwrap_or_default(),
                    created_at: parse_datetime(&created_at_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }
}
