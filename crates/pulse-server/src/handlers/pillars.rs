//! Pillar management handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::{require_writer, AppError, AppState, SuccessResponse};
use pulse_core::models::Pillar;

/// Request body for creating a pillar
#[derive(Debug, Deserialize)]
pub struct CreatePillarRequest {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub display_order: i64,
}

/// GET /api/pillars - List all pillars
pub async fn list_pillars(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Pillar>>, AppError> {
    Ok(Json(state.db.list_pillars()?))
}

/// POST /api/pillars - Create a pillar
pub async fn create_pillar(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreatePillarRequest>,
) -> Result<Json<Pillar>, AppError> {
    let user = require_writer(&state, &headers)?;

    let id = state.db.upsert_pillar(
        &req.name,
        req.color.as_deref(),
        req.icon.as_deref(),
        req.display_order,
    )?;

    info!(user = %user, pillar = %req.name, "Pillar created");

    let pillar = state
        .db
        .get_pillar(id)?
        .ok_or_else(|| AppError::internal("Pillar not found after creation"))?;
    Ok(Json(pillar))
}

/// GET /api/pillars/:id - Get a single pillar
pub async fn get_pillar(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Pillar>, AppError> {
    let pillar = state
        .db
        .get_pillar(id)?
        .ok_or_else(|| AppError::not_found(&format!("Pillar {} not found", id)))?;
    Ok(Json(pillar))
}

/// DELETE /api/pillars/:id - Delete a pillar and everything under it
pub async fn delete_pillar(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, AppError> {
    let user = require_writer(&state, &headers)?;

    state
        .db
        .get_pillar(id)?
        .ok_or_else(|| AppError::not_found(&format!("Pillar {} not found", id)))?;

    state.db.delete_pillar(id)?;
    info!(user = %user, pillar_id = id, "Pillar deleted");

    Ok(Json(SuccessResponse { success: true }))
}
