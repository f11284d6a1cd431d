//! Expedition service: outbound shipment allocation drawing from lots
//!
//! Same all-or-nothing reservation algorithm as consolidation, plus the
//! physical precondition that every referenced reception is currently
//! positioned in storage. A GLOBALG.A.P.-declared shipment additionally
//! requires a valid producer certificate for every item at the expedition
//! date.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::models::generate_expedition_code;
use shared::validation::{validate_allocation_items, validate_vehicle_plate};

use crate::error::{AppError, AppResult};
use crate::services::certification::CertificationService;
use crate::services::ledger::{LotLedger, OperationKind};

/// Expedition service
#[derive(Clone)]
pub struct ExpeditionService {
    db: PgPool,
}

/// Expedition row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ExpeditionRow {
    pub id: Uuid,
    pub expedition_code: String,
    pub destination: String,
    pub expedition_date: NaiveDate,
    pub total_weight_kg: Decimal,
    pub status: String,
    pub transporter: Option<String>,
    pub vehicle_plate: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Allocation line with reception and producer identification
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ExpeditionItemRow {
    pub id: Uuid,
    pub reception_id: Uuid,
    pub reception_code: String,
    pub producer_name: String,
    pub quantity_kg: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Expedition with its allocation lines
#[derive(Debug, Clone, Serialize)]
pub struct ExpeditionWithItems {
    #[serde(flatten)]
    pub expedition: ExpeditionRow,
    pub items: Vec<ExpeditionItemRow>,
}

/// One input line of an expedition
#[derive(Debug, Clone, Deserialize)]
pub struct ExpeditionItemInput {
    pub reception_id: Uuid,
    pub quantity_kg: Decimal,
}

/// Input for creating an expedition
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExpeditionInput {
    #[validate(length(min = 1, message = "Destination cannot be empty"))]
    pub destination: String,
    pub expedition_date: NaiveDate,
    pub items: Vec<ExpeditionItemInput>,
    pub transporter: Option<String>,
    pub vehicle_plate: Option<String>,
    pub notes: Option<String>,
    /// Ship under a GLOBALG.A.P. compliance declaration; gates every item on
    /// certificate validity
    #[serde(default)]
    pub globalgap_declared: bool,
}

impl ExpeditionService {
    /// Create a new ExpeditionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an expedition, reserving quantity from every referenced
    /// reception. All-or-nothing: a failed reservation, gate check or
    /// position check rolls the whole transaction back.
    pub async fn create_expedition(
        &self,
        input: CreateExpeditionInput,
    ) -> AppResult<ExpeditionWithItems> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        if let Some(ref plate) = input.vehicle_plate {
            validate_vehicle_plate(plate)
                .map_err(|msg| AppError::Validation {
                    field: "vehicle_plate".to_string(),
                    message: msg.to_string(),
                    message_pt: "Placa de veículo inválida".to_string(),
                })?;
        }

        let pairs: Vec<(Uuid, Decimal)> = input
            .items
            .iter()
            .map(|i| (i.reception_id, i.quantity_kg))
            .collect();
        validate_allocation_items(&pairs)
            .map_err(|msg| AppError::ValidationError(msg.to_string()))?;

        // Lock receptions in ascending id order so concurrent multi-item
        // allocations cannot deadlock
        let mut items = input.items.clone();
        items.sort_by_key(|i| i.reception_id);

        let total_weight: Decimal = items.iter().map(|i| i.quantity_kg).sum();
        let expedition_id = Uuid::new_v4();

        let mut tx = self.db.begin().await?;

        for item in &items {
            // Expeditable check: the lot must be physically positioned in
            // storage, read at decision time
            let positioned = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM current_lot_positions WHERE reception_id = $1)",
            )
            .bind(item.reception_id)
            .fetch_one(&mut *tx)
            .await?;

            if !positioned {
                return Err(AppError::Validation {
                    field: "items".to_string(),
                    message: format!(
                        "Reception {} has no storage position and cannot be expedited",
                        item.reception_id
                    ),
                    message_pt: "O lote não possui posição de armazenamento".to_string(),
                });
            }

            if input.globalgap_declared {
                CertificationService::require_certified(
                    &mut tx,
                    item.reception_id,
                    input.expedition_date,
                )
                .await?;
            }

            LotLedger::reserve(
                &mut tx,
                OperationKind::Expedition,
                expedition_id,
                item.reception_id,
                item.quantity_kg,
            )
            .await?;
        }

        let sequence: i32 =
            sqlx::query_scalar("SELECT next_allocation_sequence('expedition', $1)")
                .bind(input.expedition_date.year())
                .fetch_one(&mut *tx)
                .await?;
        let expedition_code = generate_expedition_code(input.expedition_date.year(), sequence);

        sqlx::query(
            r#"
            INSERT INTO expeditions
                (id, expedition_code, destination, expedition_date, total_weight_kg,
                 status, transporter, vehicle_plate, notes)
            VALUES ($1, $2, $3, $4, $5, 'active', $6, $7, $8)
            "#,
        )
        .bind(expedition_id)
        .bind(&expedition_code)
        .bind(&input.destination)
        .bind(input.expedition_date)
        .bind(total_weight)
        .bind(&input.transporter)
        .bind(&input.vehicle_plate)
        .bind(&input.notes)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO expedition_items (expedition_id, reception_id, quantity_kg)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(expedition_id)
            .bind(item.reception_id)
            .bind(item.quantity_kg)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            expedition_code = %expedition_code,
            total_weight_kg = %total_weight,
            "expedition created"
        );

        self.get_expedition(expedition_id).await
    }

    /// Get an expedition with its items
    pub async fn get_expedition(&self, expedition_id: Uuid) -> AppResult<ExpeditionWithItems> {
        let expedition = sqlx::query_as::<_, ExpeditionRow>(
            r#"
            SELECT id, expedition_code, destination, expedition_date, total_weight_kg,
                   status, transporter, vehicle_plate, notes, created_at
            FROM expeditions
            WHERE id = $1
            "#,
        )
        .bind(expedition_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Expedition".to_string()))?;

        let items = sqlx::query_as::<_, ExpeditionItemRow>(
            r#"
            SELECT ei.id, ei.reception_id, r.reception_code, p.name AS producer_name,
                   ei.quantity_kg, ei.created_at
            FROM expedition_items ei
            JOIN receptions r ON r.id = ei.reception_id
            JOIN producers p ON p.id = r.producer_id
            WHERE ei.expedition_id = $1
            ORDER BY ei.created_at
            "#,
        )
        .bind(expedition_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ExpeditionWithItems { expedition, items })
    }

    /// List expeditions, newest first
    pub async fn list_expeditions(&self) -> AppResult<Vec<ExpeditionRow>> {
        let expeditions = sqlx::query_as::<_, ExpeditionRow>(
            r#"
            SELECT id, expedition_code, destination, expedition_date, total_weight_kg,
                   status, transporter, vehicle_plate, notes, created_at
            FROM expeditions
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(expeditions)
    }

    /// Reverse an expedition: mark it inactive and release its reservations.
    /// Symmetric to consolidation reversal, with the same double-delete
    /// guard.
    pub async fn delete_expedition(&self, expedition_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            "UPDATE expeditions SET status = 'inactive' WHERE id = $1 AND status = 'active'",
        )
        .bind(expedition_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM expeditions WHERE id = $1)",
            )
            .bind(expedition_id)
            .fetch_one(&mut *tx)
            .await?;

            return if exists {
                Err(AppError::Conflict {
                    resource: "expedition".to_string(),
                    message: "Expedition is already inactive".to_string(),
                    message_pt: "A expedição já está inativa".to_string(),
                })
            } else {
                Err(AppError::NotFound("Expedition".to_string()))
            };
        }

        LotLedger::release(&mut tx, OperationKind::Expedition, expedition_id).await?;

        tx.commit().await?;

        tracing::info!(expedition_id = %expedition_id, "expedition reversed");

        Ok(())
    }
}
