//! HTTP handlers for certification gate endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::certification::{CertificationService, ExpiringProducer};
use crate::AppState;

/// Query parameters for the certifiability check
#[derive(Debug, Deserialize)]
pub struct CertifiableQuery {
    /// Date to evaluate the certificate against; defaults to today
    pub at_date: Option<NaiveDate>,
}

/// Query parameters for the expiring-certificates report
#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    /// Lookahead window in days; defaults to 30
    pub within_days: Option<i64>,
}

/// Certifiability verdict for a reception
#[derive(Debug, Serialize)]
pub struct CertifiableResponse {
    pub reception_id: Uuid,
    pub at_date: NaiveDate,
    pub certifiable: bool,
}

/// Whether a reception's producer certificate is valid at a date
pub async fn check_certifiable(
    State(state): State<AppState>,
    Path(reception_id): Path<Uuid>,
    Query(query): Query<CertifiableQuery>,
) -> AppResult<Json<CertifiableResponse>> {
    let at_date = query.at_date.unwrap_or_else(|| Utc::now().date_naive());
    let service = CertificationService::new(state.db);
    let certifiable = service.is_certifiable(reception_id, at_date).await?;
    Ok(Json(CertifiableResponse {
        reception_id,
        at_date,
        certifiable,
    }))
}

/// Producers whose certificates expire inside the lookahead window
pub async fn get_expiring_certifications(
    State(state): State<AppState>,
    Query(query): Query<ExpiringQuery>,
) -> AppResult<Json<Vec<ExpiringProducer>>> {
    let service = CertificationService::new(state.db);
    let producers = service
        .expiring_producers(query.within_days.unwrap_or(30))
        .await?;
    Ok(Json(producers))
}
