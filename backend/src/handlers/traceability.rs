//! HTTP handlers for chain-of-custody traceability endpoints

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::traceability::TraceabilityService;
use crate::AppState;

/// Query parameters for traceability endpoints
#[derive(Debug, Deserialize)]
pub struct TraceQuery {
    /// Include reversed allocations (forensic audits)
    #[serde(default)]
    pub include_inactive: bool,
    /// "json" (default) or "csv"
    pub format: Option<String>,
}

/// Forward trace: all allocations that drew from a reception
pub async fn trace_forward(
    State(state): State<AppState>,
    Path(reception_id): Path<Uuid>,
    Query(query): Query<TraceQuery>,
) -> AppResult<impl IntoResponse> {
    let service = TraceabilityService::new(state.db);
    let view = service
        .trace_forward(reception_id, query.include_inactive)
        .await?;

    if query.format.as_deref() == Some("csv") {
        let csv = TraceabilityService::export_to_csv(&view.entries)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"trace_forward.csv\"",
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(view).into_response())
    }
}

/// Backward trace: producer lots behind a consolidated lot
pub async fn trace_backward_consolidation(
    State(state): State<AppState>,
    Path(consolidated_lot_id): Path<Uuid>,
    Query(query): Query<TraceQuery>,
) -> AppResult<impl IntoResponse> {
    let service = TraceabilityService::new(state.db);
    let view = service
        .trace_backward_consolidation(consolidated_lot_id, query.include_inactive)
        .await?;

    if query.format.as_deref() == Some("csv") {
        let csv = TraceabilityService::export_to_csv(&view.origins)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"trace_consolidation.csv\"",
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(view).into_response())
    }
}

/// Backward trace: producer lots behind an expedition
pub async fn trace_backward_expedition(
    State(state): State<AppState>,
    Path(expedition_id): Path<Uuid>,
    Query(query): Query<TraceQuery>,
) -> AppResult<impl IntoResponse> {
    let service = TraceabilityService::new(state.db);
    let view = service
        .trace_backward_expedition(expedition_id, query.include_inactive)
        .await?;

    if query.format.as_deref() == Some("csv") {
        let csv = TraceabilityService::export_to_csv(&view.origins)?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"trace_expedition.csv\"",
                ),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(view).into_response())
    }
}
