//! HTTP handlers for consolidation endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::consolidation::{
    ConsolidatedLotRow, ConsolidatedLotWithItems, ConsolidationService, CreateConsolidationInput,
};
use crate::AppState;

/// Create a consolidated lot from partial quantities of one or more lots
pub async fn create_consolidation(
    State(state): State<AppState>,
    Json(input): Json<CreateConsolidationInput>,
) -> AppResult<Json<ConsolidatedLotWithItems>> {
    let service = ConsolidationService::new(state.db);
    let lot = service.create_consolidation(input).await?;
    Ok(Json(lot))
}

/// List consolidated lots
pub async fn list_consolidations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ConsolidatedLotRow>>> {
    let service = ConsolidationService::new(state.db);
    let lots = service.list_consolidations().await?;
    Ok(Json(lots))
}

/// Get a consolidated lot with its items
pub async fn get_consolidation(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<ConsolidatedLotWithItems>> {
    let service = ConsolidationService::new(state.db);
    let lot = service.get_consolidation(lot_id).await?;
    Ok(Json(lot))
}

/// Reverse a consolidation, restoring the reserved quantities
pub async fn delete_consolidation(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ConsolidationService::new(state.db);
    service.delete_consolidation(lot_id).await?;
    Ok(Json(()))
}
