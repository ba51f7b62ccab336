//! Import reconciliation orchestrator
//!
//! Sequences one import attempt end to end: normalize → internal duplicate
//! check → external conflict check → persist. The session suspends whenever
//! a step needs a human decision and resumes from the matching `resolve_*`
//! call; ephemeral state (pending batch, duplicate groups, conflict set)
//! lives inside the session and dies with it. Nothing is written to storage
//! until the final merged row set is known.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::conflict::{self, ConflictSet};
use crate::db::Database;
use crate::dedupe::{self, DuplicateGroup};
use crate::error::{Error, Result};
use crate::import::NormalizedBatch;
use crate::models::{MeasurementRow, Role};

/// Where one import attempt stands after the latest step
#[derive(Debug, Clone)]
pub enum ImportOutcome {
    /// Final row set written; the attempt is over
    Committed { written: usize },
    /// The batch has same-date rows; pick one row per group and call
    /// [`ImportSession::resolve_duplicates`]
    NeedsDuplicateResolution(Vec<DuplicateGroup>),
    /// Batch dates collide with stored rows; decide keep/replace per date
    /// and call [`ImportSession::resolve_conflicts`]
    NeedsConflictResolution(ConflictSet),
}

enum Stage {
    Idle,
    AwaitingSelection {
        groups: Vec<DuplicateGroup>,
        batch: Vec<MeasurementRow>,
    },
    AwaitingDecision {
        conflicts: ConflictSet,
        batch: Vec<MeasurementRow>,
    },
}

/// One import attempt for one metric
///
/// Strictly sequential; a session in a suspended stage only accepts the
/// matching resolve call or `cancel`. Write capability is checked once at
/// construction, before any storage access.
pub struct ImportSession {
    db: Database,
    metric_id: i64,
    stage: Stage,
}

impl ImportSession {
    /// Start an import for a metric on behalf of an actor
    pub fn begin(db: Database, metric_id: i64, role: Role) -> Result<Self> {
        if !role.can_write() {
            return Err(Error::Unauthorized);
        }
        db.get_metric(metric_id)?
            .ok_or_else(|| Error::NotFound(format!("metric {}", metric_id)))?;

        Ok(Self {
            db,
            metric_id,
            stage: Stage::Idle,
        })
    }

    pub fn metric_id(&self) -> i64 {
        self.metric_id
    }

    /// Duplicate groups awaiting a selection, if suspended there
    pub fn pending_duplicates(&self) -> Option<&[DuplicateGroup]> {
        match &self.stage {
            Stage::AwaitingSelection { groups, .. } => Some(groups),
            _ => None,
        }
    }

    /// Conflict set awaiting keep/replace decisions, if suspended there
    pub fn pending_conflicts(&self) -> Option<&ConflictSet> {
        match &self.stage {
            Stage::AwaitingDecision { conflicts, .. } => Some(conflicts),
            _ => None,
        }
    }

    /// Feed a normalized batch into the pipeline
    pub fn submit(&mut self, batch: NormalizedBatch) -> Result<ImportOutcome> {
        if !matches!(self.stage, Stage::Idle) {
            return Err(Error::Import(
                "an import step is already awaiting resolution".to_string(),
            ));
        }
        if batch.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let rows = batch.rows;
        let groups = dedupe::find_duplicate_groups(&rows);
        if !groups.is_empty() {
            info!(
                metric_id = self.metric_id,
                groups = groups.len(),
                "Batch has internal duplicates, awaiting selection"
            );
            self.stage = Stage::AwaitingSelection {
                groups: groups.clone(),
                batch: rows,
            };
            return Ok(ImportOutcome::NeedsDuplicateResolution(groups));
        }

        self.check_external(rows)
    }

    /// Apply one chosen row per duplicate group and continue the pipeline
    ///
    /// An incomplete selection is refused and the session stays suspended;
    /// the caller re-prompts and tries again.
    pub fn resolve_duplicates(
        &mut self,
        selections: &HashMap<NaiveDate, usize>,
    ) -> Result<ImportOutcome> {
        let (groups, batch) = match &self.stage {
            Stage::AwaitingSelection { groups, batch } => (groups, batch),
            _ => {
                return Err(Error::Import(
                    "no duplicate resolution is pending".to_string(),
                ))
            }
        };

        let cleaned = dedupe::resolve_duplicates(batch, groups, selections)?;

        // Resolution guarantees uniqueness; verify before trusting the batch
        // across the stage boundary.
        if !dedupe::find_duplicate_groups(&cleaned).is_empty() {
            return Err(Error::InvalidData(
                "resolved batch still contains duplicate dates".to_string(),
            ));
        }

        self.check_external(cleaned)
    }

    /// Apply keep/replace decisions and persist the merged set
    ///
    /// Dates absent from `replace` keep their stored values.
    pub fn resolve_conflicts(&mut self, replace: &HashSet<NaiveDate>) -> Result<ImportOutcome> {
        let (conflicts, batch) = match &self.stage {
            Stage::AwaitingDecision { conflicts, batch } => (conflicts, batch),
            _ => {
                return Err(Error::Import(
                    "no conflict resolution is pending".to_string(),
                ))
            }
        };

        let merged = conflict::merge_resolution(batch, conflicts, replace);
        self.persist(merged)
    }

    /// Abandon the attempt; nothing has been written
    pub fn cancel(&mut self) {
        debug!(metric_id = self.metric_id, "Import cancelled");
        self.stage = Stage::Idle;
    }

    fn check_external(&mut self, batch: Vec<MeasurementRow>) -> Result<ImportOutcome> {
        let existing_dates = self.db.measurement_dates(self.metric_id)?;
        let dates = conflict::conflicting_dates(&batch, &existing_dates);
        if dates.is_empty() {
            return self.persist(batch);
        }

        info!(
            metric_id = self.metric_id,
            conflicts = dates.len(),
            "Batch collides with stored dates, awaiting decision"
        );
        let existing = self.db.measurements_for_dates(self.metric_id, &dates)?;
        let conflicts = ConflictSet::new(dates, &batch, existing);
        self.stage = Stage::AwaitingDecision {
            conflicts: conflicts.clone(),
            batch,
        };
        Ok(ImportOutcome::NeedsConflictResolution(conflicts))
    }

    fn persist(&mut self, rows: Vec<MeasurementRow>) -> Result<ImportOutcome> {
        let written = self.db.upsert_measurements(self.metric_id, &rows)?;
        self.stage = Stage::Idle;
        info!(metric_id = self.metric_id, written, "Import committed");
        Ok(ImportOutcome::Committed { written })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricType;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(date: NaiveDate, value: f64) -> MeasurementRow {
        MeasurementRow::new(date, value)
    }

    fn setup() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        let pillar_id = db.upsert_pillar("Safety", None, None, 0).unwrap();
        let metric_id = db
            .create_metric(pillar_id, "Incidents", MetricType::Count)
            .unwrap();
        (db, metric_id)
    }

    fn batch(rows: Vec<MeasurementRow>) -> NormalizedBatch {
        NormalizedBatch::from_rows(rows)
    }

    #[test]
    fn test_clean_import_commits_directly() {
        let (db, metric_id) = setup();
        let mut session = ImportSession::begin(db.clone(), metric_id, Role::Admin).unwrap();

        let outcome = session
            .submit(batch(vec![row(ymd(2025, 1, 1), 5.0)]))
            .unwrap();
        assert!(matches!(outcome, ImportOutcome::Committed { written: 1 }));

        let stored = db.list_measurements(metric_id, None, None).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].value, 5.0);
    }

    #[test]
    fn test_internal_duplicate_then_choice_wins() {
        let (db, metric_id) = setup();
        let mut session = ImportSession::begin(db.clone(), metric_id, Role::Admin).unwrap();

        let outcome = session
            .submit(batch(vec![
                row(ymd(2025, 1, 1), 5.0),
                row(ymd(2025, 1, 1), 7.0),
            ]))
            .unwrap();

        let groups = match outcome {
            ImportOutcome::NeedsDuplicateResolution(groups) => groups,
            other => panic!("expected duplicate resolution, got {:?}", other),
        };
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].rows.len(), 2);

        // Choose the second row (value 7)
        let mut selections = HashMap::new();
        selections.insert(ymd(2025, 1, 1), 1);
        let outcome = session.resolve_duplicates(&selections).unwrap();
        assert!(matches!(outcome, ImportOutcome::Committed { written: 1 }));

        let stored = db.list_measurements(metric_id, None, None).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].value, 7.0);
    }

    #[test]
    fn test_incomplete_selection_keeps_session_suspended() {
        let (db, metric_id) = setup();
        let mut session = ImportSession::begin(db, metric_id, Role::Admin).unwrap();

        session
            .submit(batch(vec![
                row(ymd(2025, 1, 1), 5.0),
                row(ymd(2025, 1, 1), 7.0),
            ]))
            .unwrap();

        let result = session.resolve_duplicates(&HashMap::new());
        assert!(matches!(result, Err(Error::IncompleteSelection(_))));

        // Still suspended; a complete selection now succeeds
        assert!(session.pending_duplicates().is_some());
        let mut selections = HashMap::new();
        selections.insert(ymd(2025, 1, 1), 0);
        let outcome = session.resolve_duplicates(&selections).unwrap();
        assert!(matches!(outcome, ImportOutcome::Committed { .. }));
    }

    #[test]
    fn test_external_conflict_keep_existing() {
        let (db, metric_id) = setup();
        db.upsert_measurements(metric_id, &[row(ymd(2025, 2, 1), 10.0)])
            .unwrap();

        let mut session = ImportSession::begin(db.clone(), metric_id, Role::Admin).unwrap();
        let outcome = session
            .submit(batch(vec![row(ymd(2025, 2, 1), 99.0)]))
            .unwrap();

        let conflicts = match outcome {
            ImportOutcome::NeedsConflictResolution(set) => set,
            other => panic!("expected conflict resolution, got {:?}", other),
        };
        assert_eq!(conflicts.dates, vec![ymd(2025, 2, 1)]);
        assert_eq!(conflicts.existing[0].value, 10.0);
        assert_eq!(conflicts.incoming[0].value, 99.0);

        // Leave everything unchecked: keep existing values
        let outcome = session.resolve_conflicts(&HashSet::new()).unwrap();
        assert!(matches!(outcome, ImportOutcome::Committed { .. }));

        let stored = db.list_measurements(metric_id, None, None).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].value, 10.0);
    }

    #[test]
    fn test_external_conflict_replace_selected() {
        let (db, metric_id) = setup();
        db.upsert_measurements(
            metric_id,
            &[row(ymd(2025, 2, 1), 10.0), row(ymd(2025, 2, 2), 20.0)],
        )
        .unwrap();

        let mut session = ImportSession::begin(db.clone(), metric_id, Role::Admin).unwrap();
        session
            .submit(batch(vec![
                row(ymd(2025, 2, 1), 11.0),
                row(ymd(2025, 2, 2), 22.0),
                row(ymd(2025, 2, 3), 33.0),
            ]))
            .unwrap();

        let replace: HashSet<NaiveDate> = [ymd(2025, 2, 2)].into();
        session.resolve_conflicts(&replace).unwrap();

        let stored = db.list_measurements(metric_id, None, None).unwrap();
        let values: Vec<f64> = stored.iter().map(|r| r.value).collect();
        // kept, replaced, new
        assert_eq!(values, vec![10.0, 22.0, 33.0]);
    }

    #[test]
    fn test_duplicates_then_conflicts_in_one_attempt() {
        let (db, metric_id) = setup();
        db.upsert_measurements(metric_id, &[row(ymd(2025, 3, 1), 1.0)])
            .unwrap();

        let mut session = ImportSession::begin(db.clone(), metric_id, Role::Admin).unwrap();
        let outcome = session
            .submit(batch(vec![
                row(ymd(2025, 3, 1), 2.0),
                row(ymd(2025, 3, 1), 3.0),
                row(ymd(2025, 3, 2), 4.0),
            ]))
            .unwrap();
        assert!(matches!(outcome, ImportOutcome::NeedsDuplicateResolution(_)));

        let mut selections = HashMap::new();
        selections.insert(ymd(2025, 3, 1), 1);
        let outcome = session.resolve_duplicates(&selections).unwrap();
        assert!(matches!(outcome, ImportOutcome::NeedsConflictResolution(_)));

        let replace: HashSet<NaiveDate> = [ymd(2025, 3, 1)].into();
        session.resolve_conflicts(&replace).unwrap();

        let stored = db.list_measurements(metric_id, None, None).unwrap();
        let values: Vec<f64> = stored.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![3.0, 4.0]);
    }

    #[test]
    fn test_viewer_cannot_begin() {
        let (db, metric_id) = setup();
        let result = ImportSession::begin(db, metric_id, Role::Viewer);
        assert!(matches!(result, Err(Error::Unauthorized)));
    }

    #[test]
    fn test_unknown_metric_refused() {
        let db = Database::in_memory().unwrap();
        let result = ImportSession::begin(db, 999, Role::Admin);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_empty_batch_refused() {
        let (db, metric_id) = setup();
        let mut session = ImportSession::begin(db, metric_id, Role::Admin).unwrap();
        let result = session.submit(NormalizedBatch::default());
        assert!(matches!(result, Err(Error::EmptyBatch)));
    }

    #[test]
    fn test_cancel_discards_pending_state_without_writes() {
        let (db, metric_id) = setup();
        db.upsert_measurements(metric_id, &[row(ymd(2025, 4, 1), 1.0)])
            .unwrap();

        let mut session = ImportSession::begin(db.clone(), metric_id, Role::Admin).unwrap();
        session
            .submit(batch(vec![row(ymd(2025, 4, 1), 2.0)]))
            .unwrap();
        assert!(session.pending_conflicts().is_some());

        session.cancel();
        assert!(session.pending_conflicts().is_none());

        // Stored data untouched; a resolve after cancel is rejected
        let stored = db.list_measurements(metric_id, None, None).unwrap();
        assert_eq!(stored[0].value, 1.0);
        let result = session.resolve_conflicts(&HashSet::new());
        assert!(matches!(result, Err(Error::Import(_))));
    }

    #[test]
    fn test_resubmit_after_cancel() {
        let (db, metric_id) = setup();
        let mut session = ImportSession::begin(db, metric_id, Role::Admin).unwrap();

        session
            .submit(batch(vec![
                row(ymd(2025, 5, 1), 1.0),
                row(ymd(2025, 5, 1), 2.0),
            ]))
            .unwrap();
        session.cancel();

        let outcome = session
            .submit(batch(vec![row(ymd(2025, 5, 2), 3.0)]))
            .unwrap();
        assert!(matches!(outcome, ImportOutcome::Committed { written: 1 }));
    }
}
