//! Measurement listing and cleanup commands

use anyhow::{Context, Result};
use chrono::NaiveDate;
use pulse_core::db::Database;
use pulse_core::models::TimePeriod;
use pulse_core::periods::period_label;

fn parse_date_arg(value: Option<&str>, flag: &str) -> Result<Option<NaiveDate>> {
    value
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .with_context(|| format!("Invalid {} date format (use YYYY-MM-DD)", flag))
}

pub fn cmd_measurements_list(
    db: &Database,
    metric_id: i64,
    from: Option<&str>,
    to: Option<&str>,
    period: &str,
) -> Result<()> {
    let metric = db
        .get_metric(metric_id)?
        .with_context(|| format!("Metric {} not found", metric_id))?;

    let from = parse_date_arg(from, "--from")?;
    let to = parse_date_arg(to, "--to")?;
    let period: TimePeriod = period
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("Expected one of: daily, weekly, monthly")?;

    let rows = db.list_measurements(metric_id, from, to)?;
    if rows.is_empty() {
        println!("No measurements for '{}'.", metric.title);
        return Ok(());
    }

    // Week numbers count from the range start, or the first row when no
    // range was given
    let range_start = from.unwrap_or(rows[0].date);

    println!("📈 {} ({} rows)", metric.title, rows.len());
    for row in &rows {
        let goal = row
            .goal
            .map(|g| format!(" goal={}", g))
            .unwrap_or_default();
        println!(
            "   {} {:>8} value={}{} [{}]",
            row.date,
            period_label(row.date, period, range_start),
            row.value,
            goal,
            row.goal_status()
        );
    }

    Ok(())
}

pub fn cmd_measurements_clear(db: &Database, metric_id: i64, dates: &[String]) -> Result<()> {
    let parsed = dates
        .iter()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid date format (use YYYY-MM-DD)")?;

    let deleted = db.delete_measurements_for_dates(metric_id, &parsed)?;
    println!("✅ Removed {} row(s)", deleted);
    Ok(())
}
