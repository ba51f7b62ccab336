//! Export commands

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use pulse_core::db::Database;
use pulse_core::export::{measurements_to_csv, template_csv};

pub fn cmd_export(
    db: &Database,
    metric_id: i64,
    output: Option<&Path>,
    template: bool,
) -> Result<()> {
    let csv = if template {
        template_csv()?
    } else {
        db.get_metric(metric_id)?
            .with_context(|| format!("Metric {} not found", metric_id))?;
        let rows = db.list_measurements(metric_id, None, None)?;
        measurements_to_csv(&rows)?
    };

    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            file.write_all(csv.as_bytes())?;

            let rows = csv.lines().count().saturating_sub(1);
            println!("✅ Exported {} row(s) to {}", rows, path.display());
        }
        None => {
            // Write to stdout
            print!("{}", csv);
        }
    }

    Ok(())
}
