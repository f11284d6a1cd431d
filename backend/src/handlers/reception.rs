//! HTTP handlers for reception lifecycle and availability endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::reception::{
    AvailabilityView, LabelPayload, ReceptionFilter, ReceptionRow, ReceptionService,
    ReceptionWithAvailability,
};
use crate::AppState;

/// List receptions, optionally filtered by status and producer
pub async fn list_receptions(
    State(state): State<AppState>,
    Query(filter): Query<ReceptionFilter>,
) -> AppResult<Json<Vec<ReceptionRow>>> {
    let service = ReceptionService::new(state.db);
    let receptions = service.list_receptions(filter).await?;
    Ok(Json(receptions))
}

/// Get a reception with its ledger availability
pub async fn get_reception(
    State(state): State<AppState>,
    Path(reception_id): Path<Uuid>,
) -> AppResult<Json<ReceptionWithAvailability>> {
    let service = ReceptionService::new(state.db);
    let reception = service.get_reception(reception_id).await?;
    Ok(Json(reception))
}

/// Approve a pending reception
pub async fn approve_reception(
    State(state): State<AppState>,
    Path(reception_id): Path<Uuid>,
) -> AppResult<Json<ReceptionRow>> {
    let service = ReceptionService::new(state.db);
    let reception = service.approve(reception_id).await?;
    Ok(Json(reception))
}

/// Reject a pending reception
pub async fn reject_reception(
    State(state): State<AppState>,
    Path(reception_id): Path<Uuid>,
) -> AppResult<Json<ReceptionRow>> {
    let service = ReceptionService::new(state.db);
    let reception = service.reject(reception_id).await?;
    Ok(Json(reception))
}

/// Get ledger availability for a reception
pub async fn get_availability(
    State(state): State<AppState>,
    Path(reception_id): Path<Uuid>,
) -> AppResult<Json<AvailabilityView>> {
    let service = ReceptionService::new(state.db);
    let availability = service.availability(reception_id).await?;
    Ok(Json(availability))
}

/// Get the label payload for a reception (read-only, for the label printer)
pub async fn get_label_payload(
    State(state): State<AppState>,
    Path(reception_id): Path<Uuid>,
) -> AppResult<Json<LabelPayload>> {
    let service = ReceptionService::new(state.db);
    let payload = service.label_payload(reception_id).await?;
    Ok(Json(payload))
}
