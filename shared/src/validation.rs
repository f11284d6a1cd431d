//! Validation utilities for the Produce Traceability Platform
//!
//! Includes Brazil-specific validations for transport and GLOBALG.A.P.
//! compliance fields.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::MovementType;

// ============================================================================
// Allocation Validations
// ============================================================================

/// Validate a single allocation quantity (must be strictly positive)
pub fn validate_quantity_kg(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate the item list of an allocation call before any reservation is
/// attempted: at least one item, all quantities positive, no reception
/// referenced twice in the same call.
pub fn validate_allocation_items(items: &[(Uuid, Decimal)]) -> Result<(), &'static str> {
    if items.is_empty() {
        return Err("At least one item is required");
    }
    for (_, quantity) in items {
        validate_quantity_kg(*quantity)?;
    }
    let mut seen: Vec<Uuid> = Vec::with_capacity(items.len());
    for (reception_id, _) in items {
        if seen.contains(reception_id) {
            return Err("The same reception cannot appear twice in one allocation");
        }
        seen.push(*reception_id);
    }
    Ok(())
}

/// Validate that a movement carries exactly the locations its type requires
pub fn validate_movement_shape(
    movement_type: MovementType,
    has_from: bool,
    has_to: bool,
) -> Result<(), &'static str> {
    match movement_type {
        MovementType::Entrada | MovementType::Consolidacao => {
            if !has_to {
                return Err("This movement type requires a destination location");
            }
            if has_from {
                return Err("An inbound movement must not carry an origin location");
            }
        }
        MovementType::Saida => {
            if !has_from {
                return Err("An outbound movement requires an origin location");
            }
            if has_to {
                return Err("An outbound movement must not carry a destination location");
            }
        }
        MovementType::Transferencia => {
            if !has_from || !has_to {
                return Err("A transfer requires both origin and destination locations");
            }
        }
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate an intake reception code: "YYYYMMDD-NNNNNN"
pub fn validate_reception_code(code: &str) -> Result<(), &'static str> {
    let parts: Vec<&str> = code.split('-').collect();
    if parts.len() != 2 {
        return Err("Reception code must be in YYYYMMDD-NNNNNN format");
    }
    if parts[0].len() != 8 || !parts[0].chars().all(|c| c.is_ascii_digit()) {
        return Err("Reception code date part must be 8 digits");
    }
    if parts[1].len() != 6 || !parts[1].chars().all(|c| c.is_ascii_digit()) {
        return Err("Reception code sequence part must be 6 digits");
    }
    Ok(())
}

/// Validate a storage location code (2-20 uppercase alphanumeric, dashes allowed)
pub fn validate_location_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 2 {
        return Err("Location code must be at least 2 characters");
    }
    if code.len() > 20 {
        return Err("Location code must be at most 20 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Location code must be uppercase alphanumeric");
    }
    Ok(())
}

// ============================================================================
// Brazil-Specific Validations
// ============================================================================

/// Validate a Brazilian vehicle plate.
/// Accepts the legacy format (ABC-1234 / ABC1234) and the Mercosul format
/// (ABC1D23).
pub fn validate_vehicle_plate(plate: &str) -> Result<(), &'static str> {
    let normalized: String = plate
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_uppercase();

    if normalized.len() != 7 {
        return Err("Vehicle plate must have 7 characters");
    }

    let chars: Vec<char> = normalized.chars().collect();
    let legacy = chars[..3].iter().all(|c| c.is_ascii_uppercase())
        && chars[3..].iter().all(|c| c.is_ascii_digit());
    let mercosul = chars[..3].iter().all(|c| c.is_ascii_uppercase())
        && chars[3].is_ascii_digit()
        && chars[4].is_ascii_uppercase()
        && chars[5].is_ascii_digit()
        && chars[6].is_ascii_digit();

    if legacy || mercosul {
        Ok(())
    } else {
        Err("Invalid vehicle plate format")
    }
}

/// Validate a GLOBALG.A.P. Number (GGN): exactly 13 digits
pub fn validate_ggn(ggn: &str) -> Result<(), &'static str> {
    if ggn.len() == 13 && ggn.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err("GGN must be exactly 13 digits")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn uuid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn quantity_must_be_positive() {
        assert!(validate_quantity_kg(Decimal::new(1, 2)).is_ok()); // 0.01
        assert!(validate_quantity_kg(Decimal::ZERO).is_err());
        assert!(validate_quantity_kg(Decimal::from(-5)).is_err());
    }

    #[test]
    fn allocation_items_must_be_non_empty() {
        assert!(validate_allocation_items(&[]).is_err());
    }

    #[test]
    fn allocation_items_reject_zero_quantity() {
        let items = vec![(uuid(1), Decimal::from(10)), (uuid(2), Decimal::ZERO)];
        assert!(validate_allocation_items(&items).is_err());
    }

    #[test]
    fn allocation_items_reject_duplicate_receptions() {
        let items = vec![(uuid(1), Decimal::from(10)), (uuid(1), Decimal::from(5))];
        assert!(validate_allocation_items(&items).is_err());
    }

    #[test]
    fn allocation_items_accept_valid_list() {
        let items = vec![(uuid(1), Decimal::from(10)), (uuid(2), Decimal::from(5))];
        assert!(validate_allocation_items(&items).is_ok());
    }

    #[test]
    fn movement_shape_entrada_needs_destination_only() {
        assert!(validate_movement_shape(MovementType::Entrada, false, true).is_ok());
        assert!(validate_movement_shape(MovementType::Entrada, false, false).is_err());
        assert!(validate_movement_shape(MovementType::Entrada, true, true).is_err());
    }

    #[test]
    fn movement_shape_saida_needs_origin_only() {
        assert!(validate_movement_shape(MovementType::Saida, true, false).is_ok());
        assert!(validate_movement_shape(MovementType::Saida, false, false).is_err());
        assert!(validate_movement_shape(MovementType::Saida, true, true).is_err());
    }

    #[test]
    fn movement_shape_transfer_needs_both() {
        assert!(validate_movement_shape(MovementType::Transferencia, true, true).is_ok());
        assert!(validate_movement_shape(MovementType::Transferencia, true, false).is_err());
        assert!(validate_movement_shape(MovementType::Transferencia, false, true).is_err());
    }

    #[test]
    fn reception_code_format() {
        assert!(validate_reception_code("20240315-482913").is_ok());
        assert!(validate_reception_code("2024315-482913").is_err());
        assert!(validate_reception_code("20240315-48").is_err());
        assert!(validate_reception_code("20240315482913").is_err());
    }

    #[test]
    fn location_code_format() {
        assert!(validate_location_code("CAM1-A3").is_ok());
        assert!(validate_location_code("DOCA").is_ok());
        assert!(validate_location_code("a3").is_err());
        assert!(validate_location_code("X").is_err());
    }

    #[test]
    fn vehicle_plate_legacy_and_mercosul() {
        assert!(validate_vehicle_plate("ABC-1234").is_ok());
        assert!(validate_vehicle_plate("ABC1234").is_ok());
        assert!(validate_vehicle_plate("ABC1D23").is_ok());
        assert!(validate_vehicle_plate("AB-1234").is_err());
        assert!(validate_vehicle_plate("1234ABC").is_err());
    }

    #[test]
    fn ggn_is_thirteen_digits() {
        assert!(validate_ggn("4049928123456").is_ok());
        assert!(validate_ggn("404992812345").is_err());
        assert!(validate_ggn("404992812345X").is_err());
    }

    mod properties {
        use proptest::prelude::*;
        use rust_decimal::Decimal;
        use uuid::Uuid;

        use crate::validation::{validate_allocation_items, validate_ggn, validate_quantity_kg};

        proptest! {
            #[test]
            fn any_positive_quantity_is_accepted(n in 1..=10_000_000i64) {
                prop_assert!(validate_quantity_kg(Decimal::new(n, 2)).is_ok());
            }

            #[test]
            fn any_thirteen_digit_ggn_is_accepted(digits in proptest::collection::vec(0..=9u8, 13)) {
                let ggn: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
                prop_assert!(validate_ggn(&ggn).is_ok());
            }

            #[test]
            fn unique_positive_items_always_validate(quantities in proptest::collection::vec(1..=100_000i64, 1..10)) {
                let items: Vec<(Uuid, Decimal)> = quantities
                    .into_iter()
                    .enumerate()
                    .map(|(i, q)| (Uuid::from_u128(i as u128 + 1), Decimal::new(q, 2)))
                    .collect();
                prop_assert!(validate_allocation_items(&items).is_ok());
            }
        }
    }
}
