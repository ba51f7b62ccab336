//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(date: NaiveDate, value: f64) -> MeasurementRow {
        MeasurementRow::new(date, value)
    }

    fn setup_metric(db: &Database) -> i64 {
        let pillar_id = db.upsert_pillar("Safety", Some("#16a34a"), None, 0).unwrap();
        db.create_metric(pillar_id, "Incidents", MetricType::Count)
            .unwrap()
    }

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        assert!(db.list_pillars().unwrap().is_empty());
    }

    #[test]
    fn test_pillar_upsert_is_idempotent() {
        let db = Database::in_memory().unwrap();

        let id = db.upsert_pillar("Quality", None, Some("Q"), 1).unwrap();
        assert!(id > 0);

        // Upsert same name returns same ID
        let id2 = db.upsert_pillar("Quality", None, Some("Q"), 1).unwrap();
        assert_eq!(id, id2);

        let pillars = db.list_pillars().unwrap();
        assert_eq!(pillars.len(), 1);
        assert_eq!(pillars[0].name, "Quality");
        assert_eq!(pillars[0].icon.as_deref(), Some("Q"));
    }

    #[test]
    fn test_metric_crud() {
        let db = Database::in_memory().unwrap();
        let pillar_id = db.upsert_pillar("Delivery", None, None, 0).unwrap();

        let id = db
            .create_metric(pillar_id, "On-time %", MetricType::Percent)
            .unwrap();

        let metric = db.get_metric(id).unwrap().unwrap();
        assert_eq!(metric.title, "On-time %");
        assert_eq!(metric.metric_type, MetricType::Percent);

        db.update_metric(id, "On-time rate", MetricType::Percent)
            .unwrap();
        let metric = db.get_metric(id).unwrap().unwrap();
        assert_eq!(metric.title, "On-time rate");

        assert_eq!(db.list_metrics(Some(pillar_id)).unwrap().len(), 1);

        db.delete_metric(id).unwrap();
        assert!(db.get_metric(id).unwrap().is_none());
    }

    #[test]
    fn test_upsert_measurements_overwrites_only_given_dates() {
        let db = Database::in_memory().unwrap();
        let metric_id = setup_metric(&db);

        db.upsert_measurements(
            metric_id,
            &[row(ymd(2025, 1, 1), 1.0), row(ymd(2025, 1, 2), 2.0)],
        )
        .unwrap();

        // Second batch touches one existing date and adds a new one
        db.upsert_measurements(
            metric_id,
            &[row(ymd(2025, 1, 2), 20.0), row(ymd(2025, 1, 3), 3.0)],
        )
        .unwrap();

        let all = db.list_measurements(metric_id, None, None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].value, 1.0); // untouched
        assert_eq!(all[1].value, 20.0); // overwritten
        assert_eq!(all[2].value, 3.0); // inserted
    }

    #[test]
    fn test_upsert_preserves_untracked_thresholds() {
        let db = Database::in_memory().unwrap();
        let metric_id = setup_metric(&db);

        let mut with_goal = row(ymd(2025, 1, 1), 5.0);
        with_goal.goal = Some(0.0);
        db.upsert_measurements(metric_id, &[with_goal]).unwrap();

        let stored = &db.list_measurements(metric_id, None, None).unwrap()[0];
        // Zero threshold round-trips as zero, absent as None
        assert_eq!(stored.goal, Some(0.0));
        assert_eq!(stored.meet_goal, None);
    }

    #[test]
    fn test_measurement_dates_and_fetch() {
        let db = Database::in_memory().unwrap();
        let metric_id = setup_metric(&db);

        db.upsert_measurements(
            metric_id,
            &[row(ymd(2025, 2, 2), 2.0), row(ymd(2025, 2, 1), 1.0)],
        )
        .unwrap();

        let dates = db.measurement_dates(metric_id).unwrap();
        assert_eq!(dates, vec![ymd(2025, 2, 1), ymd(2025, 2, 2)]);

        let fetched = db
            .measurements_for_dates(metric_id, &[ymd(2025, 2, 2), ymd(2025, 2, 3)])
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].value, 2.0);
    }

    #[test]
    fn test_delete_measurements_for_dates() {
        let db = Database::in_memory().unwrap();
        let metric_id = setup_metric(&db);

        db.upsert_measurements(
            metric_id,
            &[row(ymd(2025, 3, 1), 1.0), row(ymd(2025, 3, 2), 2.0)],
        )
        .unwrap();

        let deleted = db
            .delete_measurements_for_dates(metric_id, &[ymd(2025, 3, 1)])
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(db.measurement_dates(metric_id).unwrap(), vec![ymd(2025, 3, 2)]);
    }

    #[test]
    fn test_list_measurements_range() {
        let db = Database::in_memory().unwrap();
        let metric_id = setup_metric(&db);

        db.upsert_measurements(
            metric_id,
            &[
                row(ymd(2025, 1, 1), 1.0),
                row(ymd(2025, 1, 15), 2.0),
                row(ymd(2025, 2, 1), 3.0),
            ],
        )
        .unwrap();

        let january = db
            .list_measurements(metric_id, Some(ymd(2025, 1, 1)), Some(ymd(2025, 1, 31)))
            .unwrap();
        assert_eq!(january.len(), 2);
    }

    #[test]
    fn test_action_plan_counts() {
        let db = Database::in_memory().unwrap();
        let pillar_id = db.upsert_pillar("Safety", None, None, 0).unwrap();

        db.create_action_plan(pillar_id, "Audit PPE", ymd(2025, 4, 1), ActionPlanStatus::Open)
            .unwrap();
        db.create_action_plan(
            pillar_id,
            "Review near-misses",
            ymd(2025, 3, 1),
            ActionPlanStatus::Overdue,
        )
        .unwrap();
        let plan_id = db
            .create_action_plan(pillar_id, "Train crew", ymd(2025, 5, 1), ActionPlanStatus::Open)
            .unwrap();

        let counts = db.action_plan_counts(pillar_id).unwrap();
        assert_eq!(counts.open, 2);
        assert_eq!(counts.overdue, 1);
        assert_eq!(counts.pending, 0);

        db.update_action_plan_status(plan_id, ActionPlanStatus::Pending)
            .unwrap();
        let counts = db.action_plan_counts(pillar_id).unwrap();
        assert_eq!(counts.open, 1);
        assert_eq!(counts.pending, 1);

        // Sorted by due date
        let plans = db.list_action_plans(Some(pillar_id)).unwrap();
        assert_eq!(plans[0].title, "Review near-misses");
    }

    #[test]
    fn test_user_roles() {
        let db = Database::in_memory().unwrap();

        db.upsert_user("ops", Role::Admin).unwrap();
        assert_eq!(db.role_for_user("ops").unwrap(), Some(Role::Admin));
        assert_eq!(db.role_for_user("nobody").unwrap(), None);

        // Upsert updates the role in place
        let id = db.upsert_user("ops", Role::Viewer).unwrap();
        assert_eq!(db.role_for_user("ops").unwrap(), Some(Role::Viewer));

        let id2 = db.upsert_user("ops", Role::Admin).unwrap();
        assert_eq!(id, id2);
        assert_eq!(db.list_users().unwrap().len(), 1);
    }
}
