//! Reception (received lot) models and lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A physical intake event of produce from one producer.
///
/// `quantity_kg` is frozen at approval and becomes the opening balance of the
/// lot ledger; everything consumed afterwards is tracked as reservations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reception {
    pub id: Uuid,
    /// Intake code assigned by the reception flow (e.g. "20240315-482913")
    pub reception_code: String,
    pub producer_id: Uuid,
    pub product_type: String,
    pub quantity_kg: Decimal,
    pub reception_date: NaiveDate,
    pub harvest_date: Option<NaiveDate>,
    pub status: ReceptionStatus,
    pub lot_number: Option<String>,
    pub notes: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle state of a reception.
///
/// `Pending` transitions exactly once to `Approved` or `Rejected`; both are
/// terminal. Allocatability after approval is governed by the lot ledger
/// balance, not by additional states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceptionStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReceptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceptionStatus::Pending => "pending",
            ReceptionStatus::Approved => "approved",
            ReceptionStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReceptionStatus::Pending),
            "approved" => Some(ReceptionStatus::Approved),
            "rejected" => Some(ReceptionStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReceptionStatus::Approved | ReceptionStatus::Rejected)
    }

    /// Whether the lifecycle admits this transition.
    pub fn can_transition_to(&self, target: ReceptionStatus) -> bool {
        matches!(
            (self, target),
            (ReceptionStatus::Pending, ReceptionStatus::Approved)
                | (ReceptionStatus::Pending, ReceptionStatus::Rejected)
        )
    }
}

impl std::fmt::Display for ReceptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product types handled by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Tomate,
    Alface,
    Pepino,
    Pimentao,
    AbacateHass,
    AbacateGeada,
    AbacateBrede,
    AbacateMargarida,
    MangaTommy,
    MangaMaca,
    MangaPalmer,
    Mel,
    LimaoTahiti,
    Outros,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Tomate => "tomate",
            ProductType::Alface => "alface",
            ProductType::Pepino => "pepino",
            ProductType::Pimentao => "pimentao",
            ProductType::AbacateHass => "abacate_hass",
            ProductType::AbacateGeada => "abacate_geada",
            ProductType::AbacateBrede => "abacate_brede",
            ProductType::AbacateMargarida => "abacate_margarida",
            ProductType::MangaTommy => "manga_tommy",
            ProductType::MangaMaca => "manga_maca",
            ProductType::MangaPalmer => "manga_palmer",
            ProductType::Mel => "mel",
            ProductType::LimaoTahiti => "limao_tahiti",
            ProductType::Outros => "outros",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "tomate" => Some(ProductType::Tomate),
            "alface" => Some(ProductType::Alface),
            "pepino" => Some(ProductType::Pepino),
            "pimentao" => Some(ProductType::Pimentao),
            "abacate_hass" => Some(ProductType::AbacateHass),
            "abacate_geada" => Some(ProductType::AbacateGeada),
            "abacate_brede" => Some(ProductType::AbacateBrede),
            "abacate_margarida" => Some(ProductType::AbacateMargarida),
            "manga_tommy" => Some(ProductType::MangaTommy),
            "manga_maca" => Some(ProductType::MangaMaca),
            "manga_palmer" => Some(ProductType::MangaPalmer),
            "mel" => Some(ProductType::Mel),
            "limao_tahiti" => Some(ProductType::LimaoTahiti),
            "outros" => Some(ProductType::Outros),
            _ => None,
        }
    }
}
