//! Certification gate: supplier certificate validity checks at allocation time
//!
//! The gate is evaluated against the allocation date, not display-time "now",
//! so an allocation created while a certificate was valid remains provably
//! valid even after the certificate later expires.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Certification service
#[derive(Clone)]
pub struct CertificationService {
    db: PgPool,
}

/// Producer certificate data resolved through a reception
#[derive(Debug, Clone, FromRow)]
struct ProducerCertificate {
    producer_name: String,
    certificate_number: Option<String>,
    certificate_expiry: NaiveDate,
}

/// Producer whose certificate lapses inside a lookahead window
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ExpiringProducer {
    pub id: Uuid,
    pub name: String,
    pub farm_name: Option<String>,
    pub certificate_number: Option<String>,
    pub certificate_expiry: NaiveDate,
    pub ggn: Option<String>,
    pub production_volume_tons: Option<Decimal>,
}

impl CertificationService {
    /// Create a new CertificationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Whether the reception's producer holds a certificate valid at the
    /// given date
    pub async fn is_certifiable(
        &self,
        reception_id: Uuid,
        at_date: NaiveDate,
    ) -> AppResult<bool> {
        let cert = sqlx::query_as::<_, ProducerCertificate>(
            r#"
            SELECT p.name AS producer_name, p.certificate_number, p.certificate_expiry
            FROM receptions r
            JOIN producers p ON p.id = r.producer_id
            WHERE r.id = $1
            "#,
        )
        .bind(reception_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Reception".to_string()))?;

        Ok(Self::valid_on(cert.certificate_expiry, at_date))
    }

    /// Gate check used inside allocation transactions: errors with the
    /// producer's certificate details when validity fails at `at_date`.
    pub async fn require_certified(
        conn: &mut PgConnection,
        reception_id: Uuid,
        at_date: NaiveDate,
    ) -> AppResult<()> {
        let cert = sqlx::query_as::<_, ProducerCertificate>(
            r#"
            SELECT p.name AS producer_name, p.certificate_number, p.certificate_expiry
            FROM receptions r
            JOIN producers p ON p.id = r.producer_id
            WHERE r.id = $1
            "#,
        )
        .bind(reception_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Reception".to_string()))?;

        if !Self::valid_on(cert.certificate_expiry, at_date) {
            return Err(AppError::CertificationExpired(format!(
                "producer {} (certificate {}) expired on {}",
                cert.producer_name,
                cert.certificate_number.as_deref().unwrap_or("n/a"),
                cert.certificate_expiry
            )));
        }

        Ok(())
    }

    /// Producers whose certificates lapse within the next `within_days` days
    pub async fn expiring_producers(&self, within_days: i64) -> AppResult<Vec<ExpiringProducer>> {
        let producers = sqlx::query_as::<_, ExpiringProducer>(
            r#"
            SELECT id, name, farm_name, certificate_number, certificate_expiry,
                   ggn, production_volume_tons
            FROM producers
            WHERE is_active = true
              AND certificate_expiry >= CURRENT_DATE
              AND certificate_expiry <= CURRENT_DATE + ($1 || ' days')::INTERVAL
            ORDER BY certificate_expiry ASC
            "#,
        )
        .bind(within_days.to_string())
        .fetch_all(&self.db)
        .await?;

        Ok(producers)
    }

    /// A certificate expiring on `at_date` is no longer valid on that day
    fn valid_on(certificate_expiry: NaiveDate, at_date: NaiveDate) -> bool {
        certificate_expiry > at_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn certificate_valid_before_expiry() {
        assert!(CertificationService::valid_on(date(2024, 1, 1), date(2023, 12, 1)));
    }

    #[test]
    fn certificate_invalid_after_expiry() {
        assert!(!CertificationService::valid_on(date(2024, 1, 1), date(2024, 6, 1)));
    }

    #[test]
    fn certificate_invalid_on_expiry_day() {
        assert!(!CertificationService::valid_on(date(2024, 1, 1), date(2024, 1, 1)));
    }
}
