//! Consolidated lot models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A merged shippable unit built from partial quantities of one or more lots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedLot {
    pub id: Uuid,
    /// Unique human-readable code (e.g. "CONS-2024-0017")
    pub consolidation_code: String,
    pub client_name: String,
    pub product_type: String,
    /// Always equal to the sum of the active item quantities
    pub total_quantity_kg: Decimal,
    pub status: AllocationStatus,
    pub consolidation_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One allocation line of a consolidated lot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedLotItem {
    pub id: Uuid,
    pub consolidated_lot_id: Uuid,
    pub reception_id: Uuid,
    pub quantity_used_kg: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Status of a reversible allocation (consolidation or expedition).
///
/// `Inactive` means reversed; the rows are never physically removed so the
/// audit trail survives the reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStatus {
    Active,
    Inactive,
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStatus::Active => "active",
            AllocationStatus::Inactive => "inactive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(AllocationStatus::Active),
            "inactive" => Some(AllocationStatus::Inactive),
            _ => None,
        }
    }
}

/// Generate a consolidation code from the yearly sequence
pub fn generate_consolidation_code(year: i32, sequence: i32) -> String {
    format!("CONS-{}-{:04}", year, sequence)
}
