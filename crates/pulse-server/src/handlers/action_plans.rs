//! Action plan handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::{require_writer, AppError, AppState, SuccessResponse};
use pulse_core::db::ActionPlanCounts;
use pulse_core::models::{ActionPlan, ActionPlanStatus};

/// Query parameters for listing action plans
#[derive(Debug, Deserialize)]
pub struct ListPlansQuery {
    pub pillar_id: Option<i64>,
}

/// Request body for creating an action plan
#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    pub pillar_id: i64,
    pub title: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: ActionPlanStatus,
}

/// Request body for updating a plan's status
#[derive(Debug, Deserialize)]
pub struct UpdatePlanStatusRequest {
    pub status: ActionPlanStatus,
}

/// GET /api/plans - List action plans, optionally filtered by pillar
pub async fn list_action_plans(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListPlansQuery>,
) -> Result<Json<Vec<ActionPlan>>, AppError> {
    Ok(Json(state.db.list_action_plans(params.pillar_id)?))
}

/// POST /api/plans - Create an action plan
pub async fn create_action_plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreatePlanRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let user = require_writer(&state, &headers)?;

    state
        .db
        .get_pillar(req.pillar_id)?
        .ok_or_else(|| AppError::bad_request(&format!("Pillar {} not found", req.pillar_id)))?;

    state
        .db
        .create_action_plan(req.pillar_id, &req.title, req.due_date, req.status)?;

    info!(user = %user, plan = %req.title, "Action plan created");
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/plans/:id/status - Update a plan's status
pub async fn update_action_plan_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<UpdatePlanStatusRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    require_writer(&state, &headers)?;

    state.db.update_action_plan_status(id, req.status)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// DELETE /api/plans/:id - Delete an action plan
pub async fn delete_action_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, AppError> {
    require_writer(&state, &headers)?;

    state.db.delete_action_plan(id)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/pillars/:id/plan-counts - Status counts for a pillar's plans
pub async fn get_action_plan_counts(
    State(state): State<Arc<AppState>>,
    Path(pillar_id): Path<i64>,
) -> Result<Json<ActionPlanCounts>, AppError> {
    state
        .db
        .get_pillar(pillar_id)?
        .ok_or_else(|| AppError::not_found(&format!("Pillar {} not found", pillar_id)))?;

    Ok(Json(state.db.action_plan_counts(pillar_id)?))
}
