//! Storage service: physical locations, movement log and current positions
//!
//! Movements are an append-only log; `current_lot_positions` is the
//! materialized projection of the latest movement per reception, updated in
//! the same transaction as the insert. Storage state is independent of the
//! commercial lot ledger and never affects it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::models::MovementType;
use shared::types::DateRange;
use shared::validation::{validate_location_code, validate_movement_shape, validate_quantity_kg};

use crate::error::{AppError, AppResult};

/// Storage service
#[derive(Clone)]
pub struct StorageService {
    db: PgPool,
}

/// Storage location row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StorageLocationRow {
    pub id: Uuid,
    pub location_code: String,
    pub name: String,
    pub zone_type: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a storage location
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLocationInput {
    pub location_code: String,
    #[validate(length(min = 1, message = "Location name cannot be empty"))]
    pub name: String,
    pub zone_type: Option<String>,
}

/// Movement row with location codes resolved for display
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MovementRow {
    pub id: Uuid,
    pub reception_id: Uuid,
    pub reception_code: String,
    pub movement_type: String,
    pub from_location_id: Option<Uuid>,
    pub from_location_code: Option<String>,
    pub to_location_id: Option<Uuid>,
    pub to_location_code: Option<String>,
    pub quantity_kg: Decimal,
    pub movement_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a movement
#[derive(Debug, Deserialize)]
pub struct RecordMovementInput {
    pub reception_id: Uuid,
    pub movement_type: String,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub quantity_kg: Decimal,
    pub movement_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Filter for listing movements
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub reception_id: Option<Uuid>,
    pub range: Option<DateRange>,
}

/// Current position row with reception and location identification
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PositionRow {
    pub id: Uuid,
    pub reception_id: Uuid,
    pub reception_code: String,
    pub product_type: String,
    pub current_location_id: Uuid,
    pub location_code: String,
    pub entry_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StorageService {
    /// Create a new StorageService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List storage locations
    pub async fn list_locations(&self) -> AppResult<Vec<StorageLocationRow>> {
        let locations = sqlx::query_as::<_, StorageLocationRow>(
            r#"
            SELECT id, location_code, name, zone_type, is_active, created_at
            FROM storage_locations
            WHERE is_active = true
            ORDER BY location_code
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(locations)
    }

    /// Create a storage location
    pub async fn create_location(
        &self,
        input: CreateLocationInput,
    ) -> AppResult<StorageLocationRow> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        validate_location_code(&input.location_code).map_err(|msg| AppError::Validation {
            field: "location_code".to_string(),
            message: msg.to_string(),
            message_pt: "Código de localização inválido".to_string(),
        })?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM storage_locations WHERE location_code = $1)",
        )
        .bind(&input.location_code)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::Conflict {
                resource: "location_code".to_string(),
                message: format!("Location {} already exists", input.location_code),
                message_pt: format!("A localização {} já existe", input.location_code),
            });
        }

        let location = sqlx::query_as::<_, StorageLocationRow>(
            r#"
            INSERT INTO storage_locations (location_code, name, zone_type)
            VALUES ($1, $2, $3)
            RETURNING id, location_code, name, zone_type, is_active, created_at
            "#,
        )
        .bind(&input.location_code)
        .bind(&input.name)
        .bind(&input.zone_type)
        .fetch_one(&self.db)
        .await?;

        Ok(location)
    }

    /// Record a physical movement and update the position projection in one
    /// transaction.
    ///
    /// Outbound movements (`saida`, `transferencia`) must not move more than
    /// is currently positioned at the origin location for that reception;
    /// the violation is a validation error and never touches the commercial
    /// ledger.
    pub async fn record_movement(&self, input: RecordMovementInput) -> AppResult<MovementRow> {
        let movement_type = MovementType::from_str(&input.movement_type).ok_or_else(|| {
            AppError::Validation {
                field: "movement_type".to_string(),
                message: format!("Unknown movement type: {}", input.movement_type),
                message_pt: format!("Tipo de movimentação desconhecido: {}", input.movement_type),
            }
        })?;

        validate_movement_shape(
            movement_type,
            input.from_location_id.is_some(),
            input.to_location_id.is_some(),
        )
        .map_err(|msg| AppError::ValidationError(msg.to_string()))?;

        validate_quantity_kg(input.quantity_kg)
            .map_err(|msg| AppError::ValidationError(msg.to_string()))?;

        let reception_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM receptions WHERE id = $1)",
        )
        .bind(input.reception_id)
        .fetch_one(&self.db)
        .await?;

        if !reception_exists {
            return Err(AppError::NotFound("Reception".to_string()));
        }

        for location_id in [input.from_location_id, input.to_location_id]
            .into_iter()
            .flatten()
        {
            let location_exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM storage_locations WHERE id = $1 AND is_active = true)",
            )
            .bind(location_id)
            .fetch_one(&self.db)
            .await?;

            if !location_exists {
                return Err(AppError::NotFound("Storage location".to_string()));
            }
        }

        let movement_date = input.movement_date.unwrap_or_else(Utc::now);

        let mut tx = self.db.begin().await?;

        if movement_type.is_outbound() {
            // The shape check above guarantees an origin for outbound types
            if let Some(origin) = input.from_location_id {
                let positioned = Self::positioned_at(&mut tx, input.reception_id, origin).await?;

                if input.quantity_kg > positioned {
                    return Err(AppError::Validation {
                        field: "quantity_kg".to_string(),
                        message: format!(
                            "Cannot move {} kg out of the origin location; only {} kg positioned there",
                            input.quantity_kg, positioned
                        ),
                        message_pt: format!(
                            "Não é possível mover {} kg; apenas {} kg posicionados na origem",
                            input.quantity_kg, positioned
                        ),
                    });
                }
            }
        }

        let movement_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO lot_movements
                (reception_id, movement_type, from_location_id, to_location_id,
                 quantity_kg, movement_date, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(input.reception_id)
        .bind(movement_type.as_str())
        .bind(input.from_location_id)
        .bind(input.to_location_id)
        .bind(input.quantity_kg)
        .bind(movement_date)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        // Project the movement onto current_lot_positions
        if let Some(to_location) = input.to_location_id {
            sqlx::query(
                r#"
                INSERT INTO current_lot_positions
                    (reception_id, current_location_id, last_movement_id, entry_date, updated_at)
                VALUES ($1, $2, $3, $4, now())
                ON CONFLICT (reception_id)
                DO UPDATE SET current_location_id = EXCLUDED.current_location_id,
                              last_movement_id = EXCLUDED.last_movement_id,
                              updated_at = now()
                "#,
            )
            .bind(input.reception_id)
            .bind(to_location)
            .bind(movement_id)
            .bind(movement_date)
            .execute(&mut *tx)
            .await?;
        } else if movement_type == MovementType::Saida {
            // A saida that empties the lot's positioned quantity removes the
            // projection row; a partial saida leaves the lot where it was
            let remaining = sqlx::query_scalar::<_, Decimal>(
                r#"
                SELECT COALESCE(SUM(CASE WHEN to_location_id IS NOT NULL THEN quantity_kg ELSE 0 END), 0)
                     - COALESCE(SUM(CASE WHEN from_location_id IS NOT NULL THEN quantity_kg ELSE 0 END), 0)
                FROM lot_movements
                WHERE reception_id = $1
                "#,
            )
            .bind(input.reception_id)
            .fetch_one(&mut *tx)
            .await?;

            if remaining <= Decimal::ZERO {
                sqlx::query("DELETE FROM current_lot_positions WHERE reception_id = $1")
                    .bind(input.reception_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        self.get_movement(movement_id).await
    }

    /// Quantity of a reception currently positioned at one location,
    /// computed over the movement log
    async fn positioned_at(
        conn: &mut sqlx::PgConnection,
        reception_id: Uuid,
        location_id: Uuid,
    ) -> AppResult<Decimal> {
        let positioned = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(CASE WHEN to_location_id = $2 THEN quantity_kg ELSE 0 END), 0)
                 - COALESCE(SUM(CASE WHEN from_location_id = $2 THEN quantity_kg ELSE 0 END), 0)
            FROM lot_movements
            WHERE reception_id = $1
            "#,
        )
        .bind(reception_id)
        .bind(location_id)
        .fetch_one(conn)
        .await?;

        Ok(positioned)
    }

    async fn get_movement(&self, movement_id: Uuid) -> AppResult<MovementRow> {
        let movement = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT m.id, m.reception_id, r.reception_code, m.movement_type,
                   m.from_location_id, fl.location_code AS from_location_code,
                   m.to_location_id, tl.location_code AS to_location_code,
                   m.quantity_kg, m.movement_date, m.notes, m.created_at
            FROM lot_movements m
            JOIN receptions r ON r.id = m.reception_id
            LEFT JOIN storage_locations fl ON fl.id = m.from_location_id
            LEFT JOIN storage_locations tl ON tl.id = m.to_location_id
            WHERE m.id = $1
            "#,
        )
        .bind(movement_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))?;

        Ok(movement)
    }

    /// List movements, optionally filtered by reception and date range
    pub async fn list_movements(&self, filter: MovementFilter) -> AppResult<Vec<MovementRow>> {
        let (start, end) = match filter.range {
            Some(range) => (Some(range.start), Some(range.end)),
            None => (None, None),
        };

        let movements = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT m.id, m.reception_id, r.reception_code, m.movement_type,
                   m.from_location_id, fl.location_code AS from_location_code,
                   m.to_location_id, tl.location_code AS to_location_code,
                   m.quantity_kg, m.movement_date, m.notes, m.created_at
            FROM lot_movements m
            JOIN receptions r ON r.id = m.reception_id
            LEFT JOIN storage_locations fl ON fl.id = m.from_location_id
            LEFT JOIN storage_locations tl ON tl.id = m.to_location_id
            WHERE ($1::UUID IS NULL OR m.reception_id = $1)
              AND ($2::DATE IS NULL OR m.movement_date::DATE >= $2)
              AND ($3::DATE IS NULL OR m.movement_date::DATE <= $3)
            ORDER BY m.movement_date DESC
            "#,
        )
        .bind(filter.reception_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Current positions of all stored lots
    pub async fn current_positions(&self) -> AppResult<Vec<PositionRow>> {
        let positions = sqlx::query_as::<_, PositionRow>(
            r#"
            SELECT cp.id, cp.reception_id, r.reception_code, r.product_type,
                   cp.current_location_id, sl.location_code,
                   cp.entry_date, cp.updated_at
            FROM current_lot_positions cp
            JOIN receptions r ON r.id = cp.reception_id
            JOIN storage_locations sl ON sl.id = cp.current_location_id
            ORDER BY cp.entry_date DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(positions)
    }

    /// Current position of one reception
    pub async fn position_for_reception(&self, reception_id: Uuid) -> AppResult<PositionRow> {
        let position = sqlx::query_as::<_, PositionRow>(
            r#"
            SELECT cp.id, cp.reception_id, r.reception_code, r.product_type,
                   cp.current_location_id, sl.location_code,
                   cp.entry_date, cp.updated_at
            FROM current_lot_positions cp
            JOIN receptions r ON r.id = cp.reception_id
            JOIN storage_locations sl ON sl.id = cp.current_location_id
            WHERE cp.reception_id = $1
            "#,
        )
        .bind(reception_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Lot position".to_string()))?;

        Ok(position)
    }
}
