//! Metric management handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::{require_writer, AppError, AppState, SuccessResponse};
use pulse_core::models::{Metric, MetricType};

/// Query parameters for listing metrics
#[derive(Debug, Deserialize)]
pub struct ListMetricsQuery {
    pub pillar_id: Option<i64>,
}

/// Request body for creating a metric
#[derive(Debug, Deserialize)]
pub struct CreateMetricRequest {
    pub pillar_id: i64,
    pub title: String,
    #[serde(default)]
    pub metric_type: MetricType,
}

/// GET /api/metrics - List metrics, optionally filtered by pillar
pub async fn list_metrics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListMetricsQuery>,
) -> Result<Json<Vec<Metric>>, AppError> {
    Ok(Json(state.db.list_metrics(params.pillar_id)?))
}

/// POST /api/metrics - Create a metric
pub async fn create_metric(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateMetricRequest>,
) -> Result<Json<Metric>, AppError> {
    let user = require_writer(&state, &headers)?;

    state
        .db
        .get_pillar(req.pillar_id)?
        .ok_or_else(|| AppError::bad_request(&format!("Pillar {} not found", req.pillar_id)))?;

    let id = state
        .db
        .create_metric(req.pillar_id, &req.title, req.metric_type)?;

    info!(user = %user, metric = %req.title, "Metric created");

    let metric = state
        .db
        .get_metric(id)?
        .ok_or_else(|| AppError::internal("Metric not found after creation"))?;
    Ok(Json(metric))
}

/// GET /api/metrics/:id - Get a single metric
pub async fn get_metric(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Metric>, AppError> {
    let metric = state
        .db
        .get_metric(id)?
        .ok_or_else(|| AppError::not_found(&format!("Metric {} not found", id)))?;
    Ok(Json(metric))
}

/// DELETE /api/metrics/:id - Delete a metric and its measurements
pub async fn delete_metric(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, AppError> {
    let user = require_writer(&state, &headers)?;

    state
        .db
        .get_metric(id)?
        .ok_or_else(|| AppError::not_found(&format!("Metric {} not found", id)))?;

    state.db.delete_metric(id)?;
    info!(user = %user, metric_id = id, "Metric deleted");

    Ok(Json(SuccessResponse { success: true }))
}
