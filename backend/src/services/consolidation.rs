//! Consolidation service: merging partial lot quantities into shippable units
//!
//! Creation reserves quantity from every referenced reception inside one
//! transaction; any failure rolls the whole operation back. Deletion is a
//! soft reversal that releases exactly the reservations this consolidation
//! held.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use shared::models::{generate_consolidation_code, ProductType};
use shared::validation::validate_allocation_items;

use crate::error::{AppError, AppResult};
use crate::services::certification::CertificationService;
use crate::services::ledger::{LotLedger, OperationKind};

/// Consolidation service
#[derive(Clone)]
pub struct ConsolidationService {
    db: PgPool,
}

/// Consolidated lot row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConsolidatedLotRow {
    pub id: Uuid,
    pub consolidation_code: String,
    pub client_name: String,
    pub product_type: String,
    pub total_quantity_kg: Decimal,
    pub status: String,
    pub consolidation_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Allocation line with reception and producer identification
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConsolidatedLotItemRow {
    pub id: Uuid,
    pub reception_id: Uuid,
    pub reception_code: String,
    pub producer_name: String,
    pub quantity_used_kg: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Consolidated lot with its allocation lines
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidatedLotWithItems {
    #[serde(flatten)]
    pub lot: ConsolidatedLotRow,
    pub items: Vec<ConsolidatedLotItemRow>,
}

/// One input line of a consolidation
#[derive(Debug, Clone, Deserialize)]
pub struct ConsolidationItemInput {
    pub reception_id: Uuid,
    pub quantity_used_kg: Decimal,
}

/// Input for creating a consolidation
#[derive(Debug, Deserialize, Validate)]
pub struct CreateConsolidationInput {
    #[validate(length(min = 1, message = "Client name cannot be empty"))]
    pub client_name: String,
    pub product_type: String,
    pub items: Vec<ConsolidationItemInput>,
    pub notes: Option<String>,
    /// Allow items whose receptions carry a different product type
    #[serde(default)]
    pub mixed_products: bool,
    /// Require a valid producer certificate for every item
    #[serde(default)]
    pub certified: bool,
}

impl ConsolidationService {
    /// Create a new ConsolidationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a consolidated lot, reserving quantity from every referenced
    /// reception. All-or-nothing: if any reservation or gate check fails the
    /// whole transaction is rolled back.
    pub async fn create_consolidation(
        &self,
        input: CreateConsolidationInput,
    ) -> AppResult<ConsolidatedLotWithItems> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        if ProductType::from_str(&input.product_type).is_none() {
            return Err(AppError::Validation {
                field: "product_type".to_string(),
                message: format!("Unknown product type: {}", input.product_type),
                message_pt: format!("Tipo de produto desconhecido: {}", input.product_type),
            });
        }

        let pairs: Vec<(Uuid, Decimal)> = input
            .items
            .iter()
            .map(|i| (i.reception_id, i.quantity_used_kg))
            .collect();
        validate_allocation_items(&pairs)
            .map_err(|msg| AppError::ValidationError(msg.to_string()))?;

        // Lock receptions in ascending id order so concurrent multi-item
        // allocations cannot deadlock
        let mut items = input.items.clone();
        items.sort_by_key(|i| i.reception_id);

        let consolidation_date = Utc::now();
        let at_date = consolidation_date.date_naive();
        let total_quantity: Decimal = items.iter().map(|i| i.quantity_used_kg).sum();
        let lot_id = Uuid::new_v4();

        let mut tx = self.db.begin().await?;

        for item in &items {
            let reception = sqlx::query_as::<_, (String, String)>(
                "SELECT product_type, status FROM receptions WHERE id = $1 FOR UPDATE",
            )
            .bind(item.reception_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Reception".to_string()))?;

            Self::check_product_compatibility(
                &input.product_type,
                &reception.0,
                input.mixed_products,
            )?;

            if input.certified {
                CertificationService::require_certified(&mut *tx, item.reception_id, at_date)
                    .await?;
            }

            LotLedger::reserve(
                &mut tx,
                OperationKind::Consolidation,
                lot_id,
                item.reception_id,
                item.quantity_used_kg,
            )
            .await?;
        }

        let sequence: i32 =
            sqlx::query_scalar("SELECT next_allocation_sequence('consolidation', $1)")
                .bind(at_date.year())
                .fetch_one(&mut *tx)
                .await?;
        let consolidation_code = generate_consolidation_code(at_date.year(), sequence);

        sqlx::query(
            r#"
            INSERT INTO consolidated_lots
                (id, consolidation_code, client_name, product_type, total_quantity_kg,
                 status, consolidation_date, notes)
            VALUES ($1, $2, $3, $4, $5, 'active', $6, $7)
            "#,
        )
        .bind(lot_id)
        .bind(&consolidation_code)
        .bind(&input.client_name)
        .bind(&input.product_type)
        .bind(total_quantity)
        .bind(consolidation_date)
        .bind(&input.notes)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO consolidated_lot_items (consolidated_lot_id, reception_id, quantity_used_kg)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(lot_id)
            .bind(item.reception_id)
            .bind(item.quantity_used_kg)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            consolidation_code = %consolidation_code,
            total_quantity_kg = %total_quantity,
            "consolidation created"
        );

        self.get_consolidation(lot_id).await
    }

    /// Get a consolidated lot with its items
    pub async fn get_consolidation(&self, lot_id: Uuid) -> AppResult<ConsolidatedLotWithItems> {
        let lot = sqlx::query_as::<_, ConsolidatedLotRow>(
            r#"
            SELECT id, consolidation_code, client_name, product_type, total_quantity_kg,
                   status, consolidation_date, notes, created_at
            FROM consolidated_lots
            WHERE id = $1
            "#,
        )
        .bind(lot_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Consolidated lot".to_string()))?;

        let items = sqlx::query_as::<_, ConsolidatedLotItemRow>(
            r#"
            SELECT cli.id, cli.reception_id, r.reception_code, p.name AS producer_name,
                   cli.quantity_used_kg, cli.created_at
            FROM consolidated_lot_items cli
            JOIN receptions r ON r.id = cli.reception_id
            JOIN producers p ON p.id = r.producer_id
            WHERE cli.consolidated_lot_id = $1
            ORDER BY cli.created_at
            "#,
        )
        .bind(lot_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ConsolidatedLotWithItems { lot, items })
    }

    /// List consolidated lots, newest first
    pub async fn list_consolidations(&self) -> AppResult<Vec<ConsolidatedLotRow>> {
        let lots = sqlx::query_as::<_, ConsolidatedLotRow>(
            r#"
            SELECT id, consolidation_code, client_name, product_type, total_quantity_kg,
                   status, consolidation_date, notes, created_at
            FROM consolidated_lots
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(lots)
    }

    /// Reverse a consolidation: mark it inactive and release its
    /// reservations. The lot and its items remain for audit. Deleting an
    /// already-inactive consolidation is a conflict, not a double-release.
    pub async fn delete_consolidation(&self, lot_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            "UPDATE consolidated_lots SET status = 'inactive' WHERE id = $1 AND status = 'active'",
        )
        .bind(lot_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM consolidated_lots WHERE id = $1)",
            )
            .bind(lot_id)
            .fetch_one(&mut *tx)
            .await?;

            return if exists {
                Err(AppError::Conflict {
                    resource: "consolidated_lot".to_string(),
                    message: "Consolidation is already inactive".to_string(),
                    message_pt: "A consolidação já está inativa".to_string(),
                })
            } else {
                Err(AppError::NotFound("Consolidated lot".to_string()))
            };
        }

        LotLedger::release(&mut tx, OperationKind::Consolidation, lot_id).await?;

        tx.commit().await?;

        tracing::info!(consolidated_lot_id = %lot_id, "consolidation reversed");

        Ok(())
    }

    /// Items must match the consolidation's product type unless the mixed
    /// flag was set explicitly
    fn check_product_compatibility(
        consolidation_product: &str,
        reception_product: &str,
        mixed_allowed: bool,
    ) -> AppResult<()> {
        if !mixed_allowed && consolidation_product != reception_product {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: format!(
                    "Reception product type {} differs from consolidation product type {}; \
                     set mixed_products to allow mixed-lot consolidations",
                    reception_product, consolidation_product
                ),
                message_pt: format!(
                    "O produto {} da recepção difere do produto {} da consolidação",
                    reception_product, consolidation_product
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_product_is_compatible() {
        assert!(ConsolidationService::check_product_compatibility(
            "abacate_hass",
            "abacate_hass",
            false
        )
        .is_ok());
    }

    #[test]
    fn mixed_products_rejected_by_default() {
        assert!(ConsolidationService::check_product_compatibility(
            "abacate_hass",
            "manga_tommy",
            false
        )
        .is_err());
    }

    #[test]
    fn mixed_products_allowed_when_flagged() {
        assert!(ConsolidationService::check_product_compatibility(
            "abacate_hass",
            "manga_tommy",
            true
        )
        .is_ok());
    }
}
