//! Reception service: lifecycle of received lots and availability reads
//!
//! Receptions are created by the intake flow, never by this engine. The
//! lifecycle is a single transition from `pending` to `approved` or
//! `rejected`; afterwards allocatability is governed purely by the lot
//! ledger balance.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::ReceptionStatus;

use crate::error::{AppError, AppResult};
use crate::services::ledger::LotLedger;

/// Reception service
#[derive(Clone)]
pub struct ReceptionService {
    db: PgPool,
}

/// Reception row with producer identification
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReceptionRow {
    pub id: Uuid,
    pub reception_code: String,
    pub producer_id: Uuid,
    pub producer_name: String,
    pub product_type: String,
    pub quantity_kg: Decimal,
    pub reception_date: NaiveDate,
    pub harvest_date: Option<NaiveDate>,
    pub status: String,
    pub lot_number: Option<String>,
    pub notes: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Reception with its current ledger availability
#[derive(Debug, Clone, Serialize)]
pub struct ReceptionWithAvailability {
    #[serde(flatten)]
    pub reception: ReceptionRow,
    pub consumed_kg: Decimal,
    pub available_kg: Decimal,
}

/// Filter for listing receptions
#[derive(Debug, Default, Deserialize)]
pub struct ReceptionFilter {
    pub status: Option<String>,
    pub producer_id: Option<Uuid>,
}

/// Availability summary for UI display
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityView {
    pub reception_id: Uuid,
    pub quantity_kg: Decimal,
    pub consumed_kg: Decimal,
    pub available_kg: Decimal,
}

/// Read-only payload for the external label generator: reception and
/// producer fields embedded into printable/QR labels
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LabelPayload {
    pub reception_code: String,
    pub lot_number: Option<String>,
    pub product_type: String,
    pub quantity_kg: Decimal,
    pub reception_date: NaiveDate,
    pub harvest_date: Option<NaiveDate>,
    pub producer_name: String,
    pub farm_name: Option<String>,
    pub ggn: Option<String>,
    pub certificate_number: Option<String>,
    pub certificate_expiry: NaiveDate,
}

impl ReceptionService {
    /// Create a new ReceptionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List receptions, optionally filtered by status and producer
    pub async fn list_receptions(&self, filter: ReceptionFilter) -> AppResult<Vec<ReceptionRow>> {
        if let Some(ref status) = filter.status {
            if ReceptionStatus::from_str(status).is_none() {
                return Err(AppError::Validation {
                    field: "status".to_string(),
                    message: "Invalid reception status".to_string(),
                    message_pt: "Status de recepção inválido".to_string(),
                });
            }
        }

        let receptions = sqlx::query_as::<_, ReceptionRow>(
            r#"
            SELECT r.id, r.reception_code, r.producer_id, p.name AS producer_name,
                   r.product_type, r.quantity_kg, r.reception_date, r.harvest_date,
                   r.status, r.lot_number, r.notes, r.approved_at, r.created_at
            FROM receptions r
            JOIN producers p ON p.id = r.producer_id
            WHERE ($1::TEXT IS NULL OR r.status = $1)
              AND ($2::UUID IS NULL OR r.producer_id = $2)
            ORDER BY r.reception_date DESC, r.created_at DESC
            "#,
        )
        .bind(filter.status)
        .bind(filter.producer_id)
        .fetch_all(&self.db)
        .await?;

        Ok(receptions)
    }

    /// Get a reception with its ledger availability
    pub async fn get_reception(&self, reception_id: Uuid) -> AppResult<ReceptionWithAvailability> {
        let reception = sqlx::query_as::<_, ReceptionRow>(
            r#"
            SELECT r.id, r.reception_code, r.producer_id, p.name AS producer_name,
                   r.product_type, r.quantity_kg, r.reception_date, r.harvest_date,
                   r.status, r.lot_number, r.notes, r.approved_at, r.created_at
            FROM receptions r
            JOIN producers p ON p.id = r.producer_id
            WHERE r.id = $1
            "#,
        )
        .bind(reception_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Reception".to_string()))?;

        let ledger = LotLedger::new(self.db.clone());
        let consumed = ledger.consumed_quantity(reception_id).await?;
        let available = reception.quantity_kg - consumed;

        Ok(ReceptionWithAvailability {
            reception,
            consumed_kg: consumed,
            available_kg: available,
        })
    }

    /// Approve a pending reception, freezing its quantity as the ledger
    /// opening balance
    pub async fn approve(&self, reception_id: Uuid) -> AppResult<ReceptionRow> {
        self.transition(reception_id, ReceptionStatus::Approved).await
    }

    /// Reject a pending reception; rejected lots are never allocatable
    pub async fn reject(&self, reception_id: Uuid) -> AppResult<ReceptionRow> {
        self.transition(reception_id, ReceptionStatus::Rejected).await
    }

    async fn transition(
        &self,
        reception_id: Uuid,
        target: ReceptionStatus,
    ) -> AppResult<ReceptionRow> {
        let approved_at = match target {
            ReceptionStatus::Approved => Some(Utc::now()),
            _ => None,
        };

        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE receptions
            SET status = $1, approved_at = COALESCE($2, approved_at), updated_at = now()
            WHERE id = $3 AND status = 'pending'
            RETURNING id
            "#,
        )
        .bind(target.as_str())
        .bind(approved_at)
        .bind(reception_id)
        .fetch_optional(&self.db)
        .await?;

        if updated.is_none() {
            // Distinguish an unknown reception from one already in a
            // terminal state
            let current = sqlx::query_scalar::<_, String>(
                "SELECT status FROM receptions WHERE id = $1",
            )
            .bind(reception_id)
            .fetch_optional(&self.db)
            .await?;

            return match current {
                None => Err(AppError::NotFound("Reception".to_string())),
                Some(status) => Err(AppError::InvalidStateTransition(format!(
                    "reception is already {} and cannot become {}",
                    status,
                    target.as_str()
                ))),
            };
        }

        Ok(self.get_reception(reception_id).await?.reception)
    }

    /// Ledger availability for UI display
    pub async fn availability(&self, reception_id: Uuid) -> AppResult<AvailabilityView> {
        let quantity = sqlx::query_scalar::<_, Decimal>(
            "SELECT quantity_kg FROM receptions WHERE id = $1",
        )
        .bind(reception_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Reception".to_string()))?;

        let ledger = LotLedger::new(self.db.clone());
        let consumed = ledger.consumed_quantity(reception_id).await?;

        Ok(AvailabilityView {
            reception_id,
            quantity_kg: quantity,
            consumed_kg: consumed,
            available_kg: quantity - consumed,
        })
    }

    /// Reception and producer fields for printable/QR labels (read-only)
    pub async fn label_payload(&self, reception_id: Uuid) -> AppResult<LabelPayload> {
        let payload = sqlx::query_as::<_, LabelPayload>(
            r#"
            SELECT r.reception_code, r.lot_number, r.product_type, r.quantity_kg,
                   r.reception_date, r.harvest_date,
                   p.name AS producer_name, p.farm_name, p.ggn,
                   p.certificate_number, p.certificate_expiry
            FROM receptions r
            JOIN producers p ON p.id = r.producer_id
            WHERE r.id = $1
            "#,
        )
        .bind(reception_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Reception".to_string()))?;

        Ok(payload)
    }
}
