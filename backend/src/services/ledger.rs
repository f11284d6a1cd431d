//! Lot ledger: per-reception quantity accounting with race-safe reservations
//!
//! Every allocation (consolidation or expedition) debits a reception through
//! `reserve`, which runs inside the caller's transaction and serializes
//! concurrent writers on the reception row. Reservations are keyed per
//! (operation_type, operation_id, reception_id) so a reversal credits exactly
//! the amount that operation reserved, never more.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::error::{AppError, AppResult};

/// Kind of allocation operation holding a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Consolidation,
    Expedition,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Consolidation => "consolidation",
            OperationKind::Expedition => "expedition",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OperationKind::Consolidation => "Consolidation",
            OperationKind::Expedition => "Expedition",
        }
    }
}

/// Lot ledger service
#[derive(Clone)]
pub struct LotLedger {
    db: PgPool,
}

impl LotLedger {
    /// Create a new LotLedger instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Current available balance of a reception: quantity received minus the
    /// sum of active reservations. Never negative by construction.
    pub async fn available_quantity(&self, reception_id: uuid::Uuid) -> AppResult<Decimal> {
        let row = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT r.quantity_kg,
                   COALESCE((SELECT SUM(lr.quantity_kg)
                             FROM lot_reservations lr
                             WHERE lr.reception_id = r.id AND lr.status = 'active'), 0)
            FROM receptions r
            WHERE r.id = $1
            "#,
        )
        .bind(reception_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Reception".to_string()))?;

        Ok(row.0 - row.1)
    }

    /// Total quantity currently consumed from a reception by active
    /// reservations
    pub async fn consumed_quantity(&self, reception_id: uuid::Uuid) -> AppResult<Decimal> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM receptions WHERE id = $1)",
        )
        .bind(reception_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Reception".to_string()));
        }

        let consumed = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(quantity_kg), 0)
            FROM lot_reservations
            WHERE reception_id = $1 AND status = 'active'
            "#,
        )
        .bind(reception_id)
        .fetch_one(&self.db)
        .await?;

        Ok(consumed)
    }

    /// Reserve `amount` kg from a reception for one allocation operation.
    ///
    /// Runs inside the caller's transaction. The reception row is locked
    /// first, so of two concurrent operations that would together overdraw
    /// the lot, exactly one commits and the other observes
    /// `InsufficientQuantity`. Returns the new consumed total.
    pub async fn reserve(
        conn: &mut PgConnection,
        kind: OperationKind,
        operation_id: uuid::Uuid,
        reception_id: uuid::Uuid,
        amount: Decimal,
    ) -> AppResult<Decimal> {
        if amount <= Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Reservation amount must be positive".to_string(),
            ));
        }

        // Lock the reception row; all balance checks below happen under this
        // lock
        let reception = sqlx::query_as::<_, (Decimal, String)>(
            "SELECT quantity_kg, status FROM receptions WHERE id = $1 FOR UPDATE",
        )
        .bind(reception_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Reception".to_string()))?;

        if reception.1 != "approved" {
            return Err(AppError::ValidationError(format!(
                "Reception {} is not approved for allocation (status: {})",
                reception_id, reception.1
            )));
        }

        let consumed = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(quantity_kg), 0)
            FROM lot_reservations
            WHERE reception_id = $1 AND status = 'active'
            "#,
        )
        .bind(reception_id)
        .fetch_one(&mut *conn)
        .await?;

        Self::check_within_balance(reception.0, consumed, amount)?;

        sqlx::query(
            r#"
            INSERT INTO lot_reservations (reception_id, operation_type, operation_id, quantity_kg)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(reception_id)
        .bind(kind.as_str())
        .bind(operation_id)
        .bind(amount)
        .execute(&mut *conn)
        .await?;

        Ok(consumed + amount)
    }

    /// Release every active reservation held by one operation.
    ///
    /// Runs inside the caller's transaction. Fails with a conflict when the
    /// operation holds no active reservations, guarding against
    /// double-release on repeated deletes.
    pub async fn release(
        conn: &mut PgConnection,
        kind: OperationKind,
        operation_id: uuid::Uuid,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE lot_reservations
            SET status = 'released', released_at = now()
            WHERE operation_type = $1 AND operation_id = $2 AND status = 'active'
            "#,
        )
        .bind(kind.as_str())
        .bind(operation_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict {
                resource: kind.as_str().to_string(),
                message: format!(
                    "{} {} holds no active reservations to release",
                    kind.display_name(),
                    operation_id
                ),
                message_pt: "A operação não possui reservas ativas para liberar".to_string(),
            });
        }

        Ok(result.rows_affected())
    }

    /// Balance check for a reservation attempt
    fn check_within_balance(
        quantity_kg: Decimal,
        consumed: Decimal,
        amount: Decimal,
    ) -> AppResult<()> {
        if consumed + amount > quantity_kg {
            return Err(AppError::InsufficientQuantity(format!(
                "requested {} kg, available {} kg",
                amount,
                quantity_kg - consumed
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn reservation_within_balance_passes() {
        assert!(LotLedger::check_within_balance(dec("500"), dec("300"), dec("200")).is_ok());
    }

    #[test]
    fn reservation_at_exact_balance_passes() {
        assert!(LotLedger::check_within_balance(dec("100"), dec("0"), dec("100")).is_ok());
    }

    #[test]
    fn reservation_over_balance_fails() {
        let err = LotLedger::check_within_balance(dec("100"), dec("0"), dec("100.01"));
        assert!(matches!(err, Err(AppError::InsufficientQuantity(_))));
    }

    #[test]
    fn reservation_over_remaining_fails() {
        let err = LotLedger::check_within_balance(dec("500"), dec("500"), dec("1"));
        assert!(matches!(err, Err(AppError::InsufficientQuantity(_))));
    }
}
