//! Import command implementation
//!
//! Drives the reconciliation pipeline from the terminal: workbook (or
//! inline rows) in, then interactive prompts whenever the session suspends
//! on duplicate or conflict resolution. `--keep-existing` / `--replace-all`
//! answer the conflict step without prompting; duplicate selection is
//! always explicit.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use pulse_core::conflict::ConflictSet;
use pulse_core::dedupe::DuplicateGroup;
use pulse_core::db::Database;
use pulse_core::import::{normalize_rows, NormalizedBatch};
use pulse_core::models::{MeasurementRow, Role};
use pulse_core::reconcile::{ImportOutcome, ImportSession};
use pulse_core::xlsx;

/// How the conflict step is answered when not prompting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictMode {
    /// Prompt per conflicting date
    Ask,
    /// Keep every stored row
    KeepExisting,
    /// Replace every stored row with the incoming value
    ReplaceAll,
}

/// Parse an inline `DATE=VALUE` row
pub fn parse_inline_row(arg: &str) -> Result<MeasurementRow> {
    let (date_str, value_str) = arg
        .split_once('=')
        .with_context(|| format!("Expected DATE=VALUE, got '{}'", arg))?;
    let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}' (use YYYY-MM-DD)", date_str.trim()))?;
    let value: f64 = value_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid value '{}'", value_str.trim()))?;
    Ok(MeasurementRow::new(date, value))
}

pub fn cmd_import(
    db: &Database,
    user: &str,
    metric_id: i64,
    file: Option<&Path>,
    inline_rows: &[String],
    mode: ConflictMode,
) -> Result<()> {
    let role = db.role_for_user(user)?.unwrap_or(Role::Viewer);

    let batch = match file {
        Some(path) => {
            println!("📥 Importing {} into metric {}...", path.display(), metric_id);
            let raw = xlsx::read_workbook(path)?;
            normalize_rows(&raw)
        }
        None if !inline_rows.is_empty() => {
            let rows = inline_rows
                .iter()
                .map(|s| parse_inline_row(s))
                .collect::<Result<Vec<_>>>()?;
            println!("📥 Importing {} manual row(s) into metric {}...", rows.len(), metric_id);
            NormalizedBatch::from_rows(rows)
        }
        None => bail!("Provide --file or at least one --set DATE=VALUE row"),
    };

    if !batch.skipped.is_empty() {
        println!("⚠️  {} row(s) could not be read:", batch.skipped.len());
        for skip in &batch.skipped {
            println!("   row {}: {}", skip.index + 1, skip.reason);
        }
    }
    println!("   Found {} measurement row(s)", batch.rows.len());

    let mut session = ImportSession::begin(db.clone(), metric_id, role)?;
    let mut outcome = session.submit(batch)?;

    loop {
        match outcome {
            ImportOutcome::Committed { written } => {
                println!("✅ Import complete!");
                println!("   Wrote {} row(s)", written);
                return Ok(());
            }
            ImportOutcome::NeedsDuplicateResolution(ref groups) => {
                let selections = prompt_duplicate_selections(groups)?;
                outcome = session.resolve_duplicates(&selections)?;
            }
            ImportOutcome::NeedsConflictResolution(ref conflicts) => {
                let replace = match mode {
                    ConflictMode::ReplaceAll => conflicts.dates.iter().copied().collect(),
                    ConflictMode::KeepExisting => HashSet::new(),
                    ConflictMode::Ask => prompt_conflict_decisions(conflicts)?,
                };
                outcome = session.resolve_conflicts(&replace)?;
            }
        }
    }
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn describe_row(row: &MeasurementRow) -> String {
    let threshold = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
    format!(
        "value={} goal={} meet={} behind={} at-risk={}",
        row.value,
        threshold(row.goal),
        threshold(row.meet_goal),
        threshold(row.behind_goal),
        threshold(row.at_risk)
    )
}

/// Ask for one row per duplicate date; re-prompts until every answer is valid
fn prompt_duplicate_selections(
    groups: &[DuplicateGroup],
) -> Result<HashMap<NaiveDate, usize>> {
    println!();
    println!(
        "⚠️  {} date(s) appear more than once in the upload.",
        groups.len()
    );
    println!("   Select one row for each duplicate date to continue.");

    let mut selections = HashMap::new();
    for group in groups {
        println!();
        println!("   {}:", group.date);
        for (i, row) in group.rows.iter().enumerate() {
            println!("     [{}] {}", i + 1, describe_row(row));
        }

        loop {
            let answer = read_line(&format!(
                "   Keep which row for {}? [1-{}] ",
                group.date,
                group.rows.len()
            ))?;
            match answer.parse::<usize>() {
                Ok(n) if n >= 1 && n <= group.rows.len() => {
                    selections.insert(group.date, n - 1);
                    break;
                }
                _ => println!("   Enter a number between 1 and {}.", group.rows.len()),
            }
        }
    }

    Ok(selections)
}

/// Ask keep/replace per conflicting date; answering nothing keeps the
/// stored value
fn prompt_conflict_decisions(conflicts: &ConflictSet) -> Result<HashSet<NaiveDate>> {
    println!();
    println!(
        "⚠️  {} date(s) already have stored measurements.",
        conflicts.dates.len()
    );
    println!("   Answer y to replace the stored value; anything else keeps it.");

    let mut replace = HashSet::new();
    for date in &conflicts.dates {
        let stored = conflicts.existing.iter().find(|r| r.date == *date);
        let incoming = conflicts.incoming.iter().find(|r| r.date == *date);

        println!();
        println!("   {}:", date);
        if let Some(row) = stored {
            println!("     stored:   {}", describe_row(row));
        }
        if let Some(row) = incoming {
            println!("     incoming: {}", describe_row(row));
        }

        let answer = read_line(&format!("   Replace stored value for {}? [y/N] ", date))?;
        if answer.eq_ignore_ascii_case("y") {
            replace.insert(*date);
        }
    }

    Ok(replace)
}
