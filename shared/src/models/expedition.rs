//! Expedition (outbound shipment) models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AllocationStatus;

/// An outbound shipment drawing quantities from one or more lots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expedition {
    pub id: Uuid,
    /// Unique human-readable code (e.g. "EXP-2024-0042")
    pub expedition_code: String,
    pub destination: String,
    pub expedition_date: NaiveDate,
    /// Always equal to the sum of the active item quantities
    pub total_weight_kg: Decimal,
    pub status: AllocationStatus,
    pub transporter: Option<String>,
    pub vehicle_plate: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One allocation line of an expedition, drawing from a single reception
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpeditionItem {
    pub id: Uuid,
    pub expedition_id: Uuid,
    pub reception_id: Uuid,
    pub quantity_kg: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Generate an expedition code from the yearly sequence
pub fn generate_expedition_code(year: i32, sequence: i32) -> String {
    format!("EXP-{}-{:04}", year, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expedition_code_format() {
        assert_eq!(generate_expedition_code(2024, 1), "EXP-2024-0001");
        assert_eq!(generate_expedition_code(2025, 123), "EXP-2025-0123");
    }
}
