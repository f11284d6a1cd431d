//! HTTP handlers for expedition endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::expedition::{
    CreateExpeditionInput, ExpeditionRow, ExpeditionService, ExpeditionWithItems,
};
use crate::AppState;

/// Create an expedition drawing from one or more lots
pub async fn create_expedition(
    State(state): State<AppState>,
    Json(input): Json<CreateExpeditionInput>,
) -> AppResult<Json<ExpeditionWithItems>> {
    let service = ExpeditionService::new(state.db);
    let expedition = service.create_expedition(input).await?;
    Ok(Json(expedition))
}

/// List expeditions
pub async fn list_expeditions(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ExpeditionRow>>> {
    let service = ExpeditionService::new(state.db);
    let expeditions = service.list_expeditions().await?;
    Ok(Json(expeditions))
}

/// Get an expedition with its items
pub async fn get_expedition(
    State(state): State<AppState>,
    Path(expedition_id): Path<Uuid>,
) -> AppResult<Json<ExpeditionWithItems>> {
    let service = ExpeditionService::new(state.db);
    let expedition = service.get_expedition(expedition_id).await?;
    Ok(Json(expedition))
}

/// Reverse an expedition, restoring the reserved quantities
pub async fn delete_expedition(
    State(state): State<AppState>,
    Path(expedition_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ExpeditionService::new(state.db);
    service.delete_expedition(expedition_id).await?;
    Ok(Json(()))
}
