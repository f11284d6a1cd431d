//! Traceability resolver: chain-of-custody queries over allocation records
//!
//! Forward traces answer "where did this lot go"; backward traces answer
//! "which producer lots are inside this shipment/consolidation". Reversed
//! allocations are excluded by default and only surface under the forensic
//! `include_inactive` flag.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Traceability service
#[derive(Clone)]
pub struct TraceabilityService {
    db: PgPool,
}

/// One forward-trace entry: an allocation that consumed part of a reception
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TraceForwardEntry {
    /// "consolidation" or "expedition"
    pub allocation_type: String,
    pub operation_id: Uuid,
    pub operation_code: String,
    pub quantity_kg: Decimal,
    pub allocation_date: DateTime<Utc>,
    pub status: String,
}

/// Forward trace for one reception
#[derive(Debug, Clone, Serialize)]
pub struct TraceForwardView {
    pub reception_id: Uuid,
    pub reception_code: String,
    pub entries: Vec<TraceForwardEntry>,
}

/// One backward-trace entry: an originating producer lot
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TraceOriginEntry {
    pub reception_id: Uuid,
    pub reception_code: String,
    pub producer_id: Uuid,
    pub producer_name: String,
    pub certificate_number: Option<String>,
    pub certificate_expiry: NaiveDate,
    pub ggn: Option<String>,
    pub harvest_date: Option<NaiveDate>,
    pub quantity_kg: Decimal,
}

/// Backward trace for one allocation operation
#[derive(Debug, Clone, Serialize)]
pub struct TraceBackwardView {
    pub operation_id: Uuid,
    pub operation_code: String,
    pub allocation_type: String,
    pub status: String,
    pub origins: Vec<TraceOriginEntry>,
}

impl TraceabilityService {
    /// Create a new TraceabilityService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All allocations that drew from a reception, date ascending
    pub async fn trace_forward(
        &self,
        reception_id: Uuid,
        include_inactive: bool,
    ) -> AppResult<TraceForwardView> {
        let reception_code = sqlx::query_scalar::<_, String>(
            "SELECT reception_code FROM receptions WHERE id = $1",
        )
        .bind(reception_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Reception".to_string()))?;

        let entries = sqlx::query_as::<_, TraceForwardEntry>(
            r#"
            SELECT 'consolidation' AS allocation_type,
                   cl.id AS operation_id,
                   cl.consolidation_code AS operation_code,
                   cli.quantity_used_kg AS quantity_kg,
                   cl.consolidation_date AS allocation_date,
                   cl.status
            FROM consolidated_lot_items cli
            JOIN consolidated_lots cl ON cl.id = cli.consolidated_lot_id
            WHERE cli.reception_id = $1
              AND ($2 OR cl.status = 'active')
            UNION ALL
            SELECT 'expedition' AS allocation_type,
                   e.id AS operation_id,
                   e.expedition_code AS operation_code,
                   ei.quantity_kg AS quantity_kg,
                   e.expedition_date::TIMESTAMPTZ AS allocation_date,
                   e.status
            FROM expedition_items ei
            JOIN expeditions e ON e.id = ei.expedition_id
            WHERE ei.reception_id = $1
              AND ($2 OR e.status = 'active')
            ORDER BY allocation_date ASC
            "#,
        )
        .bind(reception_id)
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;

        Ok(TraceForwardView {
            reception_id,
            reception_code,
            entries,
        })
    }

    /// Producer lots behind a consolidated lot.
    ///
    /// A reversed consolidation is invisible here unless the forensic flag
    /// is set.
    pub async fn trace_backward_consolidation(
        &self,
        consolidated_lot_id: Uuid,
        include_inactive: bool,
    ) -> AppResult<TraceBackwardView> {
        let lot = sqlx::query_as::<_, (String, String)>(
            "SELECT consolidation_code, status FROM consolidated_lots WHERE id = $1",
        )
        .bind(consolidated_lot_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Consolidated lot".to_string()))?;

        if lot.1 != "active" && !include_inactive {
            return Err(AppError::NotFound("Active consolidated lot".to_string()));
        }

        let origins = sqlx::query_as::<_, TraceOriginEntry>(
            r#"
            SELECT r.id AS reception_id, r.reception_code,
                   p.id AS producer_id, p.name AS producer_name,
                   p.certificate_number, p.certificate_expiry, p.ggn,
                   r.harvest_date, cli.quantity_used_kg AS quantity_kg
            FROM consolidated_lot_items cli
            JOIN receptions r ON r.id = cli.reception_id
            JOIN producers p ON p.id = r.producer_id
            WHERE cli.consolidated_lot_id = $1
            ORDER BY cli.created_at ASC
            "#,
        )
        .bind(consolidated_lot_id)
        .fetch_all(&self.db)
        .await?;

        Ok(TraceBackwardView {
            operation_id: consolidated_lot_id,
            operation_code: lot.0,
            allocation_type: "consolidation".to_string(),
            status: lot.1,
            origins,
        })
    }

    /// Producer lots behind an expedition.
    pub async fn trace_backward_expedition(
        &self,
        expedition_id: Uuid,
        include_inactive: bool,
    ) -> AppResult<TraceBackwardView> {
        let expedition = sqlx::query_as::<_, (String, String)>(
            "SELECT expedition_code, status FROM expeditions WHERE id = $1",
        )
        .bind(expedition_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Expedition".to_string()))?;

        if expedition.1 != "active" && !include_inactive {
            return Err(AppError::NotFound("Active expedition".to_string()));
        }

        let origins = sqlx::query_as::<_, TraceOriginEntry>(
            r#"
            SELECT r.id AS reception_id, r.reception_code,
                   p.id AS producer_id, p.name AS producer_name,
                   p.certificate_number, p.certificate_expiry, p.ggn,
                   r.harvest_date, ei.quantity_kg
            FROM expedition_items ei
            JOIN receptions r ON r.id = ei.reception_id
            JOIN producers p ON p.id = r.producer_id
            WHERE ei.expedition_id = $1
            ORDER BY ei.created_at ASC
            "#,
        )
        .bind(expedition_id)
        .fetch_all(&self.db)
        .await?;

        Ok(TraceBackwardView {
            operation_id: expedition_id,
            operation_code: expedition.0,
            allocation_type: "expedition".to_string(),
            status: expedition.1,
            origins,
        })
    }

    /// Export report rows to CSV format
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);

        for row in data {
            wtr.serialize(row)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }

        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("CSV encoding error: {}", e)))?;

        Ok(csv_data)
    }
}
