//! Pillar management commands

use anyhow::Result;
use pulse_core::db::Database;

pub fn cmd_pillars_list(db: &Database) -> Result<()> {
    let pillars = db.list_pillars()?;
    if pillars.is_empty() {
        println!("No pillars.");
        return Ok(());
    }

    for pillar in pillars {
        println!(
            "[{}] {} (order {}{})",
            pillar.id,
            pillar.name,
            pillar.display_order,
            pillar
                .color
                .map(|c| format!(", color {}", c))
                .unwrap_or_default()
        );
    }
    Ok(())
}

pub fn cmd_pillars_add(
    db: &Database,
    name: &str,
    color: Option<&str>,
    icon: Option<&str>,
    order: i64,
) -> Result<()> {
    let id = db.upsert_pillar(name, color, icon, order)?;
    println!("✅ Pillar '{}' (id {})", name, id);
    Ok(())
}
