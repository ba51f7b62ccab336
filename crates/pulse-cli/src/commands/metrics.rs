//! Metric management commands

use anyhow::{Context, Result};
use pulse_core::db::Database;
use pulse_core::models::MetricType;

pub fn cmd_metrics_list(db: &Database, pillar_id: Option<i64>) -> Result<()> {
    let metrics = db.list_metrics(pillar_id)?;
    if metrics.is_empty() {
        println!("No metrics.");
        return Ok(());
    }

    for metric in metrics {
        println!(
            "[{}] {} ({}, pillar {})",
            metric.id, metric.title, metric.metric_type, metric.pillar_id
        );
    }
    Ok(())
}

pub fn cmd_metrics_add(db: &Database, pillar_id: i64, title: &str, kind: &str) -> Result<()> {
    db.get_pillar(pillar_id)?
        .with_context(|| format!("Pillar {} not found", pillar_id))?;

    let metric_type: MetricType = kind
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("Expected one of: count, percent, duration")?;

    let id = db.create_metric(pillar_id, title, metric_type)?;
    println!("✅ Metric '{}' (id {})", title, id);
    Ok(())
}
