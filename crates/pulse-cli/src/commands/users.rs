//! User management commands

use anyhow::Result;
use pulse_core::db::Database;
use pulse_core::models::Role;

pub fn cmd_users_list(db: &Database) -> Result<()> {
    let users = db.list_users()?;
    if users.is_empty() {
        println!("No users. Run 'pulse init' to seed the default admin.");
        return Ok(());
    }

    for user in users {
        println!("[{}] {} ({})", user.id, user.name, user.role);
    }
    Ok(())
}

pub fn cmd_users_add(db: &Database, name: &str, role: &str) -> Result<()> {
    let role: Role = role
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    db.upsert_user(name, role)?;
    println!("✅ User '{}' has the {} role", name, role);
    Ok(())
}
