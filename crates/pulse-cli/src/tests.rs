//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use pulse_core::db::Database;
use pulse_core::models::{MetricType, Role};

use crate::commands::{self, ConflictMode};

fn setup_test_db() -> Database {
    let db = Database::in_memory().unwrap();
    db.upsert_user("admin", Role::Admin).unwrap();
    db.upsert_user("guest", Role::Viewer).unwrap();
    db
}

/// Create a test pillar and metric, returning (pillar_id, metric_id)
fn create_test_metric(db: &Database) -> (i64, i64) {
    let pillar_id = db.upsert_pillar("Safety", None, None, 0).unwrap();
    let metric_id = db
        .create_metric(pillar_id, "Incidents", MetricType::Count)
        .unwrap();
    (pillar_id, metric_id)
}

// ========== Pillar/Metric Command Tests ==========

#[test]
fn test_cmd_pillars_add_and_list() {
    let db = setup_test_db();
    commands::cmd_pillars_add(&db, "Quality", Some("#f59e0b"), None, 2).unwrap();

    let pillars = db.list_pillars().unwrap();
    assert_eq!(pillars.len(), 1);
    assert_eq!(pillars[0].name, "Quality");

    assert!(commands::cmd_pillars_list(&db).is_ok());
}

#[test]
fn test_cmd_metrics_add() {
    let db = setup_test_db();
    let pillar_id = db.upsert_pillar("Delivery", None, None, 0).unwrap();

    commands::cmd_metrics_add(&db, pillar_id, "On-time rate", "percent").unwrap();

    let metrics = db.list_metrics(Some(pillar_id)).unwrap();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].metric_type, MetricType::Percent);
}

#[test]
fn test_cmd_metrics_add_unknown_pillar() {
    let db = setup_test_db();
    let result = commands::cmd_metrics_add(&db, 999, "Orphan", "count");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("not found"));
}

#[test]
fn test_cmd_plans_add_and_set_status() {
    let db = setup_test_db();
    let (pillar_id, _) = create_test_metric(&db);

    commands::cmd_plans_add(&db, pillar_id, "Audit PPE", "2025-04-01", "open").unwrap();
    let plans = db.list_action_plans(Some(pillar_id)).unwrap();
    assert_eq!(plans.len(), 1);

    commands::cmd_plans_set_status(&db, plans[0].id, "pending").unwrap();
    let plans = db.list_action_plans(Some(pillar_id)).unwrap();
    assert_eq!(plans[0].status.as_str(), "pending");
}

#[test]
fn test_cmd_plans_add_rejects_bad_date() {
    let db = setup_test_db();
    let (pillar_id, _) = create_test_metric(&db);
    let result = commands::cmd_plans_add(&db, pillar_id, "Bad", "04/01/2025", "open");
    assert!(result.is_err());
}

// ========== Import Command Tests ==========

#[test]
fn test_parse_inline_row() {
    let row = commands::parse_inline_row("2025-01-01=5.5").unwrap();
    assert_eq!(row.date.to_string(), "2025-01-01");
    assert_eq!(row.value, 5.5);

    assert!(commands::parse_inline_row("2025-01-01").is_err());
    assert!(commands::parse_inline_row("yesterday=5").is_err());
}

#[test]
fn test_cmd_import_inline_rows() {
    let db = setup_test_db();
    let (_, metric_id) = create_test_metric(&db);

    commands::cmd_import(
        &db,
        "admin",
        metric_id,
        None,
        &["2025-01-01=5".to_string(), "2025-01-02=7".to_string()],
        ConflictMode::Ask,
    )
    .unwrap();

    let rows = db.list_measurements(metric_id, None, None).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].value, 5.0);
}

#[test]
fn test_cmd_import_keep_existing() {
    let db = setup_test_db();
    let (_, metric_id) = create_test_metric(&db);

    commands::cmd_import(
        &db,
        "admin",
        metric_id,
        None,
        &["2025-02-01=10".to_string()],
        ConflictMode::Ask,
    )
    .unwrap();

    // Conflicting re-import, keeping stored values
    commands::cmd_import(
        &db,
        "admin",
        metric_id,
        None,
        &["2025-02-01=99".to_string(), "2025-02-02=7".to_string()],
        ConflictMode::KeepExisting,
    )
    .unwrap();

    let rows = db.list_measurements(metric_id, None, None).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].value, 10.0);
    assert_eq!(rows[1].value, 7.0);
}

#[test]
fn test_cmd_import_replace_all() {
    let db = setup_test_db();
    let (_, metric_id) = create_test_metric(&db);

    commands::cmd_import(
        &db,
        "admin",
        metric_id,
        None,
        &["2025-02-01=10".to_string()],
        ConflictMode::Ask,
    )
    .unwrap();

    commands::cmd_import(
        &db,
        "admin",
        metric_id,
        None,
        &["2025-02-01=99".to_string()],
        ConflictMode::ReplaceAll,
    )
    .unwrap();

    let rows = db.list_measurements(metric_id, None, None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value, 99.0);
}

#[test]
fn test_cmd_import_requires_writer_role() {
    let db = setup_test_db();
    let (_, metric_id) = create_test_metric(&db);

    let result = commands::cmd_import(
        &db,
        "guest",
        metric_id,
        None,
        &["2025-01-01=5".to_string()],
        ConflictMode::Ask,
    );
    assert!(result.is_err());
    assert!(db.list_measurements(metric_id, None, None).unwrap().is_empty());
}

#[test]
fn test_cmd_import_requires_input() {
    let db = setup_test_db();
    let (_, metric_id) = create_test_metric(&db);

    let result = commands::cmd_import(&db, "admin", metric_id, None, &[], ConflictMode::Ask);
    assert!(result.is_err());
}

// ========== Export/Clear Command Tests ==========

#[test]
fn test_cmd_export_to_file() {
    let db = setup_test_db();
    let (_, metric_id) = create_test_metric(&db);

    commands::cmd_import(
        &db,
        "admin",
        metric_id,
        None,
        &["2025-01-01=5".to_string()],
        ConflictMode::Ask,
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.csv");
    commands::cmd_export(&db, metric_id, Some(&path), false).unwrap();

    let csv = std::fs::read_to_string(&path).unwrap();
    assert!(csv.starts_with("Date,Value,Goal"));
    assert!(csv.contains("2025-01-01,5"));
}

#[test]
fn test_cmd_export_template() {
    let db = setup_test_db();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("template.csv");

    commands::cmd_export(&db, 0, Some(&path), true).unwrap();

    let csv = std::fs::read_to_string(&path).unwrap();
    assert_eq!(csv.trim(), "Date,Value,Goal,MeetGoal,BehindGoal,AtRisk");
}

#[test]
fn test_cmd_measurements_clear() {
    let db = setup_test_db();
    let (_, metric_id) = create_test_metric(&db);

    commands::cmd_import(
        &db,
        "admin",
        metric_id,
        None,
        &["2025-01-01=5".to_string(), "2025-01-02=7".to_string()],
        ConflictMode::Ask,
    )
    .unwrap();

    commands::cmd_measurements_clear(&db, metric_id, &["2025-01-01".to_string()]).unwrap();
    let rows = db.list_measurements(metric_id, None, None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value, 7.0);
}

#[test]
fn test_cmd_measurements_list() {
    let db = setup_test_db();
    let (_, metric_id) = create_test_metric(&db);

    commands::cmd_import(
        &db,
        "admin",
        metric_id,
        None,
        &["2025-01-01=5".to_string()],
        ConflictMode::Ask,
    )
    .unwrap();

    assert!(commands::cmd_measurements_list(&db, metric_id, None, None, "weekly").is_ok());
    assert!(
        commands::cmd_measurements_list(&db, metric_id, Some("bad-date"), None, "weekly").is_err()
    );
    assert!(commands::cmd_measurements_list(&db, metric_id, None, None, "hourly").is_err());
}
