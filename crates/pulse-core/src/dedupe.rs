//! Internal duplicate detection and resolution
//!
//! A batch may carry several rows for the same date (copy-paste mistakes,
//! appended corrections). Detection groups them; resolution takes exactly
//! one user-chosen row per group and refuses anything less, since defaulting
//! to "first row wins" would silently drop data.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::MeasurementRow;

/// Rows in one batch sharing a calendar date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    pub date: NaiveDate,
    /// Members in batch order, always ≥ 2
    pub rows: Vec<MeasurementRow>,
}

/// Group batch rows that collide on a date
///
/// Single pass; returns groups in order of first appearance, member rows in
/// batch order. Empty output is the common case.
pub fn find_duplicate_groups(rows: &[MeasurementRow]) -> Vec<DuplicateGroup> {
    let mut by_date: HashMap<NaiveDate, Vec<MeasurementRow>> = HashMap::new();
    let mut order: Vec<NaiveDate> = Vec::new();

    for row in rows {
        let entry = by_date.entry(row.date).or_default();
        if entry.is_empty() {
            order.push(row.date);
        }
        entry.push(row.clone());
    }

    order
        .into_iter()
        .filter_map(|date| {
            let members = by_date.remove(&date)?;
            (members.len() >= 2).then_some(DuplicateGroup {
                date,
                rows: members,
            })
        })
        .collect()
}

/// Merge user selections back into a deduplicated batch
///
/// `selections` maps each duplicate date to the chosen index within that
/// group's rows. Every group needs exactly one valid choice; otherwise the
/// whole resolution is refused and the batch is untouched. The result is
/// the non-duplicate rows plus one chosen row per group, sorted ascending
/// by date and unique per date.
pub fn resolve_duplicates(
    batch: &[MeasurementRow],
    groups: &[DuplicateGroup],
    selections: &HashMap<NaiveDate, usize>,
) -> Result<Vec<MeasurementRow>> {
    let mut resolved: Vec<MeasurementRow> = Vec::with_capacity(groups.len());
    for group in groups {
        let chosen = selections.get(&group.date).ok_or_else(|| {
            Error::IncompleteSelection(format!("no row selected for {}", group.date))
        })?;
        let row = group.rows.get(*chosen).ok_or_else(|| {
            Error::IncompleteSelection(format!(
                "selection {} out of range for {} ({} rows)",
                chosen,
                group.date,
                group.rows.len()
            ))
        })?;
        resolved.push(row.clone());
    }

    let duplicate_dates: HashSet<NaiveDate> = groups.iter().map(|g| g.date).collect();

    let mut merged: Vec<MeasurementRow> = batch
        .iter()
        .filter(|row| !duplicate_dates.contains(&row.date))
        .cloned()
        .chain(resolved)
        .collect();
    merged.sort_by_key(|row| row.date);

    Ok(merged)
}
