//! External conflict detection and resolution
//!
//! After a batch is internally unique it can still collide with rows already
//! persisted for the metric. Detection intersects the batch's dates with the
//! stored dates; resolution applies per-date keep/replace decisions, where
//! an unmarked date keeps the existing value.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::MeasurementRow;

/// Dates in the batch that already have a persisted row, with both sides
/// of each collision for comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictSet {
    /// Colliding dates, in batch order
    pub dates: Vec<NaiveDate>,
    /// Batch rows for the colliding dates
    pub incoming: Vec<MeasurementRow>,
    /// Persisted rows for the colliding dates
    pub existing: Vec<MeasurementRow>,
}

impl ConflictSet {
    /// Assemble a conflict set from the batch and the fetched stored rows
    pub fn new(
        dates: Vec<NaiveDate>,
        batch: &[MeasurementRow],
        existing: Vec<MeasurementRow>,
    ) -> Self {
        let keys: HashSet<NaiveDate> = dates.iter().copied().collect();
        let incoming = batch
            .iter()
            .filter(|row| keys.contains(&row.date))
            .cloned()
            .collect();
        Self {
            dates,
            incoming,
            existing,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Intersect batch dates with the dates already stored for the metric
///
/// Both sides are normalized `NaiveDate`s, so equality is exact calendar
/// equality; raw spreadsheet encodings never reach this comparison.
pub fn conflicting_dates(
    batch: &[MeasurementRow],
    existing_dates: &[NaiveDate],
) -> Vec<NaiveDate> {
    let existing: HashSet<NaiveDate> = existing_dates.iter().copied().collect();
    batch
        .iter()
        .map(|row| row.date)
        .filter(|date| existing.contains(date))
        .collect()
}

/// Apply per-date keep/replace decisions and produce the final row set
///
/// For each conflicting date the incoming row wins only when the date is in
/// `replace`; otherwise the existing row is carried forward unchanged
/// (whole-row, no field-level merging). Non-conflicting batch rows join
/// as-is. The result is sorted by date and unique per date by construction.
pub fn merge_resolution(
    batch: &[MeasurementRow],
    conflicts: &ConflictSet,
    replace: &HashSet<NaiveDate>,
) -> Vec<MeasurementRow> {
    let conflicting: HashSet<NaiveDate> = conflicts.dates.iter().copied().collect();

    let mut merged: Vec<MeasurementRow> = conflicts
        .dates
        .iter()
        .filter_map(|date| {
            let side = if replace.contains(date) {
                &conflicts.incoming
            } else {
                &conflicts.existing
            };
            side.iter().find(|row| row.date == *date).cloned()
        })
        .chain(
            batch
                .iter()
                .filter(|row| !conflicting.contains(&row.date))
                .cloned(),
        )
        .collect();
    merged.sort_by_key(|row| row.date);

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(date: NaiveDate, value: f64) -> MeasurementRow {
        MeasurementRow::new(date, value)
    }

    #[test]
    fn test_intersection() {
        let batch = vec![
            row(ymd(2025, 1, 1), 1.0),
            row(ymd(2025, 1, 2), 2.0),
            row(ymd(2025, 1, 3), 3.0),
        ];
        let existing = vec![ymd(2025, 1, 2), ymd(2025, 1, 3), ymd(2025, 1, 4)];

        assert_eq!(
            conflicting_dates(&batch, &existing),
            vec![ymd(2025, 1, 2), ymd(2025, 1, 3)]
        );
    }

    #[test]
    fn test_no_overlap_is_empty() {
        let batch = vec![row(ymd(2025, 1, 1), 1.0)];
        assert!(conflicting_dates(&batch, &[ymd(2025, 2, 1)]).is_empty());
    }

    #[test]
    fn test_keep_by_default() {
        let batch = vec![row(ymd(2025, 2, 1), 99.0), row(ymd(2025, 2, 2), 7.0)];
        let conflicts = ConflictSet::new(
            vec![ymd(2025, 2, 1)],
            &batch,
            vec![row(ymd(2025, 2, 1), 10.0)],
        );

        // Nothing marked for replacement
        let merged = merge_resolution(&batch, &conflicts, &HashSet::new());

        assert_eq!(merged.len(), 2);
        // Existing value survives on the conflicting date
        assert_eq!(merged[0].date, ymd(2025, 2, 1));
        assert_eq!(merged[0].value, 10.0);
        // Non-conflicting incoming row passes through unchanged
        assert_eq!(merged[1].date, ymd(2025, 2, 2));
        assert_eq!(merged[1].value, 7.0);
    }

    #[test]
    fn test_replace_all_yields_incoming_batch() {
        let batch = vec![row(ymd(2025, 2, 1), 99.0), row(ymd(2025, 2, 2), 7.0)];
        let conflicts = ConflictSet::new(
            vec![ymd(2025, 2, 1), ymd(2025, 2, 2)],
            &batch,
            vec![row(ymd(2025, 2, 1), 10.0), row(ymd(2025, 2, 2), 20.0)],
        );

        let replace: HashSet<NaiveDate> = conflicts.dates.iter().copied().collect();
        let merged = merge_resolution(&batch, &conflicts, &replace);

        assert_eq!(merged, batch);
    }

    #[test]
    fn test_replacement_is_whole_row() {
        let mut incoming = row(ymd(2025, 3, 1), 5.0);
        incoming.goal = None;
        let mut existing = row(ymd(2025, 3, 1), 4.0);
        existing.goal = Some(6.0);

        let batch = vec![incoming.clone()];
        let conflicts = ConflictSet::new(vec![ymd(2025, 3, 1)], &batch, vec![existing]);

        let replace: HashSet<NaiveDate> = [ymd(2025, 3, 1)].into();
        let merged = merge_resolution(&batch, &conflicts, &replace);

        // The incoming row wins verbatim; the existing goal is not grafted in
        assert_eq!(merged, vec![incoming]);
    }

    #[test]
    fn test_merged_set_unique_and_sorted() {
        let batch = vec![
            row(ymd(2025, 1, 3), 3.0),
            row(ymd(2025, 1, 1), 1.0),
            row(ymd(2025, 1, 2), 2.0),
        ];
        let conflicts = ConflictSet::new(
            vec![ymd(2025, 1, 3), ymd(2025, 1, 1)],
            &batch,
            vec![row(ymd(2025, 1, 3), 30.0), row(ymd(2025, 1, 1), 10.0)],
        );

        let replace: HashSet<NaiveDate> = [ymd(2025, 1, 3)].into();
        let merged = merge_resolution(&batch, &conflicts, &replace);

        let dates: Vec<NaiveDate> = merged.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![ymd(2025, 1, 1), ymd(2025, 1, 2), ymd(2025, 1, 3)]);
        assert_eq!(merged[0].value, 10.0); // kept
        assert_eq!(merged[2].value, 3.0); // replaced
    }
}
