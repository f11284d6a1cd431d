//! HTTP handlers for storage locations, movements and positions

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use shared::types::DateRange;

use crate::error::{AppError, AppResult};
use crate::services::storage::{
    CreateLocationInput, MovementFilter, MovementRow, PositionRow, RecordMovementInput,
    StorageLocationRow, StorageService,
};
use crate::AppState;

/// Query parameters for listing movements
#[derive(Debug, Deserialize)]
pub struct MovementQuery {
    pub reception_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// List storage locations
pub async fn list_locations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<StorageLocationRow>>> {
    let service = StorageService::new(state.db);
    let locations = service.list_locations().await?;
    Ok(Json(locations))
}

/// Create a storage location
pub async fn create_location(
    State(state): State<AppState>,
    Json(input): Json<CreateLocationInput>,
) -> AppResult<Json<StorageLocationRow>> {
    let service = StorageService::new(state.db);
    let location = service.create_location(input).await?;
    Ok(Json(location))
}

/// Record a physical lot movement
pub async fn record_movement(
    State(state): State<AppState>,
    Json(input): Json<RecordMovementInput>,
) -> AppResult<Json<MovementRow>> {
    let service = StorageService::new(state.db);
    let movement = service.record_movement(input).await?;
    Ok(Json(movement))
}

/// List movements, optionally filtered by reception and date range
pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<MovementQuery>,
) -> AppResult<Json<Vec<MovementRow>>> {
    let range = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => {
            if start > end {
                return Err(AppError::Validation {
                    field: "start_date".to_string(),
                    message: "Start date must not be after end date".to_string(),
                    message_pt: "A data inicial não pode ser posterior à final".to_string(),
                });
            }
            Some(DateRange { start, end })
        }
        (None, None) => None,
        _ => {
            return Err(AppError::Validation {
                field: "start_date/end_date".to_string(),
                message: "Both start_date and end_date must be provided for a range".to_string(),
                message_pt: "Informe data inicial e final para filtrar por período".to_string(),
            });
        }
    };

    let service = StorageService::new(state.db);
    let movements = service
        .list_movements(MovementFilter {
            reception_id: query.reception_id,
            range,
        })
        .await?;
    Ok(Json(movements))
}

/// Current positions of all stored lots
pub async fn list_positions(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PositionRow>>> {
    let service = StorageService::new(state.db);
    let positions = service.current_positions().await?;
    Ok(Json(positions))
}

/// Current position of one reception
pub async fn get_position(
    State(state): State<AppState>,
    Path(reception_id): Path<Uuid>,
) -> AppResult<Json<PositionRow>> {
    let service = StorageService::new(state.db);
    let position = service.position_for_reception(reception_id).await?;
    Ok(Json(position))
}
