//! Measurement query and export handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use pulse_core::export::{measurements_to_csv, template_csv};
use pulse_core::models::{GoalStatus, MeasurementRow, TimePeriod};
use pulse_core::periods::period_label;

/// Query parameters for listing measurements
#[derive(Debug, Deserialize)]
pub struct MeasurementsQuery {
    /// Inclusive start date (YYYY-MM-DD)
    pub from: Option<NaiveDate>,
    /// Inclusive end date (YYYY-MM-DD)
    pub to: Option<NaiveDate>,
    /// Bucket labels: daily, weekly, monthly
    #[serde(default)]
    pub period: TimePeriod,
}

/// A measurement row decorated for display
#[derive(Debug, Serialize)]
pub struct MeasurementView {
    #[serde(flatten)]
    pub row: MeasurementRow,
    pub period_label: String,
    pub year: i32,
    pub status: GoalStatus,
}

/// GET /api/metrics/:id/measurements - Rows with period labels and status
pub async fn list_measurements(
    State(state): State<Arc<AppState>>,
    Path(metric_id): Path<i64>,
    Query(params): Query<MeasurementsQuery>,
) -> Result<Json<Vec<MeasurementView>>, AppError> {
    state
        .db
        .get_metric(metric_id)?
        .ok_or_else(|| AppError::not_found(&format!("Metric {} not found", metric_id)))?;

    let rows = state
        .db
        .list_measurements(metric_id, params.from, params.to)?;

    // Week numbers count from the requested range start, or the first row
    let range_start = params
        .from
        .or_else(|| rows.first().map(|r| r.date))
        .unwrap_or_default();

    let views = rows
        .into_iter()
        .map(|row| MeasurementView {
            period_label: period_label(row.date, params.period, range_start),
            year: row.year(),
            status: row.goal_status(),
            row,
        })
        .collect();

    Ok(Json(views))
}

/// GET /api/metrics/:id/export - Measurement rows as CSV
pub async fn export_measurements(
    State(state): State<Arc<AppState>>,
    Path(metric_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .get_metric(metric_id)?
        .ok_or_else(|| AppError::not_found(&format!("Metric {} not found", metric_id)))?;

    let rows = state.db.list_measurements(metric_id, None, None)?;
    let csv = measurements_to_csv(&rows).map_err(|e| AppError::internal(&e.to_string()))?;

    Ok(([(header::CONTENT_TYPE, "text/csv")], csv))
}

/// GET /api/template - Empty import template
pub async fn export_template() -> Result<impl IntoResponse, AppError> {
    let csv = template_csv().map_err(|e| AppError::internal(&e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], csv))
}
