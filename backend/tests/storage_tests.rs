//! Storage movement and position projection tests
//!
//! The movement log is append-only; current positions are its projection.
//! Outbound movements must not exceed what is positioned at the origin, and
//! none of this ever touches the commercial lot ledger.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::models::MovementType;
use shared::validation::validate_movement_shape;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// In-memory projection model (mirrors services/storage.rs semantics)
// ============================================================================

#[derive(Debug, Clone)]
struct Movement {
    movement_type: MovementType,
    from_location: Option<Uuid>,
    to_location: Option<Uuid>,
    quantity_kg: Decimal,
}

#[derive(Debug, Default)]
struct PositionModel {
    movements: Vec<Movement>,
    /// Projection of the latest inbound movement; None when the lot left
    /// storage entirely
    current_location: Option<Uuid>,
}

#[derive(Debug, PartialEq, Eq)]
enum MovementError {
    Shape(&'static str),
    ExceedsPositioned,
}

impl PositionModel {
    fn positioned_at(&self, location: Uuid) -> Decimal {
        self.movements
            .iter()
            .map(|m| {
                let mut delta = Decimal::ZERO;
                if m.to_location == Some(location) {
                    delta += m.quantity_kg;
                }
                if m.from_location == Some(location) {
                    delta -= m.quantity_kg;
                }
                delta
            })
            .sum()
    }

    fn total_positioned(&self) -> Decimal {
        self.movements
            .iter()
            .map(|m| {
                let mut delta = Decimal::ZERO;
                if m.to_location.is_some() {
                    delta += m.quantity_kg;
                }
                if m.from_location.is_some() {
                    delta -= m.quantity_kg;
                }
                delta
            })
            .sum()
    }

    fn record(&mut self, movement: Movement) -> Result<(), MovementError> {
        validate_movement_shape(
            movement.movement_type,
            movement.from_location.is_some(),
            movement.to_location.is_some(),
        )
        .map_err(MovementError::Shape)?;

        if movement.movement_type.is_outbound() {
            if let Some(origin) = movement.from_location {
                if movement.quantity_kg > self.positioned_at(origin) {
                    return Err(MovementError::ExceedsPositioned);
                }
            }
        }

        let to_location = movement.to_location;
        let is_saida = movement.movement_type == MovementType::Saida;
        self.movements.push(movement);

        if let Some(location) = to_location {
            self.current_location = Some(location);
        } else if is_saida && self.total_positioned() <= Decimal::ZERO {
            self.current_location = None;
        }

        Ok(())
    }
}

fn entrada(to: Uuid, qty: &str) -> Movement {
    Movement {
        movement_type: MovementType::Entrada,
        from_location: None,
        to_location: Some(to),
        quantity_kg: dec(qty),
    }
}

fn saida(from: Uuid, qty: &str) -> Movement {
    Movement {
        movement_type: MovementType::Saida,
        from_location: Some(from),
        to_location: None,
        quantity_kg: dec(qty),
    }
}

fn transferencia(from: Uuid, to: Uuid, qty: &str) -> Movement {
    Movement {
        movement_type: MovementType::Transferencia,
        from_location: Some(from),
        to_location: Some(to),
        quantity_kg: dec(qty),
    }
}

// ============================================================================
// Unit Tests: movement validation
// ============================================================================

#[test]
fn entrada_requires_destination() {
    assert!(validate_movement_shape(MovementType::Entrada, false, true).is_ok());
    assert!(validate_movement_shape(MovementType::Entrada, true, false).is_err());
}

#[test]
fn consolidacao_requires_destination() {
    assert!(validate_movement_shape(MovementType::Consolidacao, false, true).is_ok());
    assert!(validate_movement_shape(MovementType::Consolidacao, false, false).is_err());
}

#[test]
fn cannot_move_out_more_than_positioned() {
    let cam1 = Uuid::new_v4();
    let mut model = PositionModel::default();

    model.record(entrada(cam1, "100")).unwrap();
    let result = model.record(saida(cam1, "150"));
    assert_eq!(result, Err(MovementError::ExceedsPositioned));
}

#[test]
fn cannot_transfer_from_empty_location() {
    let cam1 = Uuid::new_v4();
    let doca = Uuid::new_v4();
    let mut model = PositionModel::default();

    let result = model.record(transferencia(cam1, doca, "10"));
    assert_eq!(result, Err(MovementError::ExceedsPositioned));
}

// ============================================================================
// Unit Tests: position projection
// ============================================================================

#[test]
fn entrada_positions_the_lot() {
    let cam1 = Uuid::new_v4();
    let mut model = PositionModel::default();

    model.record(entrada(cam1, "100")).unwrap();
    assert_eq!(model.current_location, Some(cam1));
    assert_eq!(model.positioned_at(cam1), dec("100"));
}

#[test]
fn transfer_moves_the_position() {
    let cam1 = Uuid::new_v4();
    let doca = Uuid::new_v4();
    let mut model = PositionModel::default();

    model.record(entrada(cam1, "100")).unwrap();
    model.record(transferencia(cam1, doca, "100")).unwrap();

    assert_eq!(model.current_location, Some(doca));
    assert_eq!(model.positioned_at(cam1), Decimal::ZERO);
    assert_eq!(model.positioned_at(doca), dec("100"));
}

#[test]
fn full_saida_removes_the_position() {
    let cam1 = Uuid::new_v4();
    let mut model = PositionModel::default();

    model.record(entrada(cam1, "100")).unwrap();
    model.record(saida(cam1, "100")).unwrap();

    assert_eq!(model.current_location, None);
}

#[test]
fn partial_saida_keeps_the_position() {
    let cam1 = Uuid::new_v4();
    let mut model = PositionModel::default();

    model.record(entrada(cam1, "100")).unwrap();
    model.record(saida(cam1, "40")).unwrap();

    assert_eq!(model.current_location, Some(cam1));
    assert_eq!(model.positioned_at(cam1), dec("60"));
}

#[test]
fn split_across_locations_tracks_per_location_quantities() {
    let cam1 = Uuid::new_v4();
    let doca = Uuid::new_v4();
    let mut model = PositionModel::default();

    model.record(entrada(cam1, "100")).unwrap();
    model.record(transferencia(cam1, doca, "30")).unwrap();

    assert_eq!(model.positioned_at(cam1), dec("70"));
    assert_eq!(model.positioned_at(doca), dec("30"));
    // Latest inbound movement wins the single-row projection
    assert_eq!(model.current_location, Some(doca));
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// No accepted sequence of movements drives any location's positioned
    /// quantity negative: out never exceeds in, per location
    #[test]
    fn positioned_quantity_never_negative(seed in prop::collection::vec((0..4usize, 0..3usize, 0..3usize, 1..=500i64), 1..40)) {
        let locations = [Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3)];
        let mut model = PositionModel::default();

        for (kind, from, to, qty) in seed {
            let movement = match kind {
                0 => entrada(locations[to], &qty.to_string()),
                1 => saida(locations[from], &qty.to_string()),
                2 => transferencia(locations[from], locations[to], &qty.to_string()),
                _ => Movement {
                    movement_type: MovementType::Consolidacao,
                    from_location: None,
                    to_location: Some(locations[to]),
                    quantity_kg: Decimal::from(qty),
                },
            };
            let _ = model.record(movement);

            for location in locations {
                prop_assert!(model.positioned_at(location) >= Decimal::ZERO);
            }
        }
    }

    /// Quantity is conserved: the sum over locations equals total inbound
    /// minus total outbound of accepted movements
    #[test]
    fn quantity_is_conserved_across_locations(seed in prop::collection::vec((0..3usize, 0..3usize, 0..3usize, 1..=500i64), 1..40)) {
        let locations = [Uuid::from_u128(1), Uuid::from_u128(2), Uuid::from_u128(3)];
        let mut model = PositionModel::default();

        for (kind, from, to, qty) in seed {
            let movement = match kind {
                0 => entrada(locations[to], &qty.to_string()),
                1 => saida(locations[from], &qty.to_string()),
                _ => transferencia(locations[from], locations[to], &qty.to_string()),
            };
            let _ = model.record(movement);
        }

        let per_location: Decimal = locations
            .iter()
            .map(|l| model.positioned_at(*l))
            .sum();
        prop_assert_eq!(per_location, model.total_positioned());
    }
}
