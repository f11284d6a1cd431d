//! Producer (certified supplier) models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A certified produce supplier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Producer {
    pub id: Uuid,
    pub name: String,
    pub farm_name: Option<String>,
    /// GLOBALG.A.P. certificate number
    pub certificate_number: Option<String>,
    /// Certificate validity end date; allocations are gated on this
    pub certificate_expiry: NaiveDate,
    /// GLOBALG.A.P. Number (certification registry identifier)
    pub ggn: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub production_volume_tons: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Producer {
    /// Whether the producer's certificate is valid at the given date.
    ///
    /// A certificate expiring exactly on `at_date` is no longer valid: the
    /// expiry date is the first day the certificate cannot be claimed.
    pub fn certificate_valid_on(&self, at_date: NaiveDate) -> bool {
        self.certificate_expiry > at_date
    }
}
