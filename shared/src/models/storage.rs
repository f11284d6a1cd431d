//! Physical storage models: locations, movements and current positions
//!
//! The movement log and the position projection govern physical placement
//! only; commercial ownership lives in the lot ledger and is never affected
//! by storage operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A storage location inside the warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageLocation {
    pub id: Uuid,
    /// Unique short code (e.g. "CAM1-A3")
    pub location_code: String,
    pub name: String,
    /// Zone classification (e.g. "camara_fria", "doca", "pre_expedicao")
    pub zone_type: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Immutable physical-location event for a reception
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotMovement {
    pub id: Uuid,
    pub reception_id: Uuid,
    pub movement_type: MovementType,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub quantity_kg: Decimal,
    pub movement_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Type of a physical movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Lot enters storage (needs a destination)
    Entrada,
    /// Lot leaves storage (needs an origin)
    Saida,
    /// Lot moves between locations (needs both)
    Transferencia,
    /// Lot moves into a consolidation staging area (needs a destination)
    Consolidacao,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Entrada => "entrada",
            MovementType::Saida => "saida",
            MovementType::Transferencia => "transferencia",
            MovementType::Consolidacao => "consolidacao",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "entrada" => Some(MovementType::Entrada),
            "saida" => Some(MovementType::Saida),
            "transferencia" => Some(MovementType::Transferencia),
            "consolidacao" => Some(MovementType::Consolidacao),
            _ => None,
        }
    }

    /// Whether this movement takes quantity out of its origin location
    pub fn is_outbound(&self) -> bool {
        matches!(self, MovementType::Saida | MovementType::Transferencia)
    }

    /// Whether this movement places quantity at a destination location
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            MovementType::Entrada | MovementType::Transferencia | MovementType::Consolidacao
        )
    }
}

/// Materialized projection of the latest movement: where a reception
/// currently sits. Single row per reception, upserted with each movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentLotPosition {
    pub id: Uuid,
    pub reception_id: Uuid,
    pub current_location_id: Uuid,
    pub last_movement_id: Option<Uuid>,
    pub entry_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
