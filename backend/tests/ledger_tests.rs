//! Lot ledger tests
//!
//! Exercises the reservation semantics against an in-memory model mirroring
//! the service implementation:
//! - consumed never exceeds the reception quantity, under any interleaving
//! - create/delete round trips restore availability exactly
//! - repeated release is rejected without double-crediting
//! - boundary allocations succeed at exactly the available quantity

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// In-memory ledger model (mirrors services/ledger.rs semantics)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum OpKind {
    Consolidation,
    Expedition,
}

#[derive(Debug, Clone)]
struct Reservation {
    kind: OpKind,
    operation_id: Uuid,
    quantity_kg: Decimal,
    active: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum LedgerError {
    Insufficient,
    Conflict,
    NotApproved,
}

struct LedgerModel {
    quantity_kg: Decimal,
    approved: bool,
    reservations: Vec<Reservation>,
}

impl LedgerModel {
    fn approved(quantity_kg: Decimal) -> Self {
        Self {
            quantity_kg,
            approved: true,
            reservations: Vec::new(),
        }
    }

    fn pending(quantity_kg: Decimal) -> Self {
        Self {
            quantity_kg,
            approved: false,
            reservations: Vec::new(),
        }
    }

    fn consumed(&self) -> Decimal {
        self.reservations
            .iter()
            .filter(|r| r.active)
            .map(|r| r.quantity_kg)
            .sum()
    }

    fn available(&self) -> Decimal {
        self.quantity_kg - self.consumed()
    }

    /// One conditional write: commit the reservation only if the new
    /// consumed total stays within the reception quantity
    fn reserve(
        &mut self,
        kind: OpKind,
        operation_id: Uuid,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        if !self.approved {
            return Err(LedgerError::NotApproved);
        }
        let consumed = self.consumed();
        if consumed + amount > self.quantity_kg {
            return Err(LedgerError::Insufficient);
        }
        self.reservations.push(Reservation {
            kind,
            operation_id,
            quantity_kg: amount,
            active: true,
        });
        Ok(consumed + amount)
    }

    /// Release every active reservation of one operation; conflict when the
    /// operation holds none
    fn release(&mut self, kind: OpKind, operation_id: Uuid) -> Result<u64, LedgerError> {
        let mut released = 0;
        for r in &mut self.reservations {
            if r.active && r.kind == kind && r.operation_id == operation_id {
                r.active = false;
                released += 1;
            }
        }
        if released == 0 {
            Err(LedgerError::Conflict)
        } else {
            Ok(released)
        }
    }
}

// ============================================================================
// Unit Tests: boundaries and reversal
// ============================================================================

#[test]
fn reserve_exact_available_succeeds() {
    let mut ledger = LedgerModel::approved(dec("100"));
    let result = ledger.reserve(OpKind::Consolidation, Uuid::new_v4(), dec("100"));
    assert_eq!(result, Ok(dec("100")));
    assert_eq!(ledger.available(), Decimal::ZERO);
}

#[test]
fn reserve_one_cent_over_fails() {
    let mut ledger = LedgerModel::approved(dec("100"));
    let result = ledger.reserve(OpKind::Consolidation, Uuid::new_v4(), dec("100.01"));
    assert_eq!(result, Err(LedgerError::Insufficient));
    assert_eq!(ledger.available(), dec("100"));
}

#[test]
fn reserve_on_pending_reception_fails() {
    let mut ledger = LedgerModel::pending(dec("100"));
    let result = ledger.reserve(OpKind::Expedition, Uuid::new_v4(), dec("10"));
    assert_eq!(result, Err(LedgerError::NotApproved));
}

#[test]
fn two_concurrent_writers_resolve_to_one_success() {
    // Reception with 100 kg available; two operators race to allocate
    // 60 kg each. The row lock serializes them: the first conditional
    // write commits, the second observes the updated consumed total.
    let mut ledger = LedgerModel::approved(dec("100"));

    let first = ledger.reserve(OpKind::Consolidation, Uuid::new_v4(), dec("60"));
    let second = ledger.reserve(OpKind::Expedition, Uuid::new_v4(), dec("60"));

    assert_eq!(first, Ok(dec("60")));
    assert_eq!(second, Err(LedgerError::Insufficient));
    assert_eq!(ledger.consumed(), dec("60"));
}

#[test]
fn round_trip_restores_availability_exactly() {
    let mut ledger = LedgerModel::approved(dec("500"));
    let op = Uuid::new_v4();

    ledger.reserve(OpKind::Consolidation, op, dec("123.45")).unwrap();
    ledger.reserve(OpKind::Consolidation, op, dec("76.55")).unwrap();
    assert_eq!(ledger.available(), dec("300.00"));

    ledger.release(OpKind::Consolidation, op).unwrap();
    assert_eq!(ledger.available(), dec("500"));
    assert_eq!(ledger.consumed(), Decimal::ZERO);
}

#[test]
fn release_is_scoped_to_one_operation() {
    let mut ledger = LedgerModel::approved(dec("500"));
    let consolidation = Uuid::new_v4();
    let expedition = Uuid::new_v4();

    ledger
        .reserve(OpKind::Consolidation, consolidation, dec("300"))
        .unwrap();
    ledger
        .reserve(OpKind::Expedition, expedition, dec("200"))
        .unwrap();

    ledger.release(OpKind::Consolidation, consolidation).unwrap();

    // The expedition's reservation must survive the consolidation reversal
    assert_eq!(ledger.consumed(), dec("200"));
    assert_eq!(ledger.available(), dec("300"));
}

#[test]
fn double_release_conflicts_without_ledger_change() {
    let mut ledger = LedgerModel::approved(dec("100"));
    let op = Uuid::new_v4();

    ledger.reserve(OpKind::Expedition, op, dec("40")).unwrap();
    ledger.release(OpKind::Expedition, op).unwrap();
    let consumed_after_first = ledger.consumed();

    let second = ledger.release(OpKind::Expedition, op);
    assert_eq!(second, Err(LedgerError::Conflict));
    assert_eq!(ledger.consumed(), consumed_after_first);
}

#[test]
fn release_unknown_operation_conflicts() {
    let mut ledger = LedgerModel::approved(dec("100"));
    let result = ledger.release(OpKind::Consolidation, Uuid::new_v4());
    assert_eq!(result, Err(LedgerError::Conflict));
}

// ============================================================================
// Scenario: the full allocation lifecycle of one reception
// ============================================================================

#[test]
fn allocation_lifecycle_scenario() {
    // Reception A: 500 kg, approved, certificate valid
    let mut ledger = LedgerModel::approved(dec("500"));
    let consolidation = Uuid::new_v4();
    let expedition_a = Uuid::new_v4();
    let expedition_b = Uuid::new_v4();

    // Consolidate 300 kg
    assert!(ledger
        .reserve(OpKind::Consolidation, consolidation, dec("300"))
        .is_ok());
    assert_eq!(ledger.available(), dec("200"));

    // Expedite the remaining 200 kg
    assert!(ledger
        .reserve(OpKind::Expedition, expedition_a, dec("200"))
        .is_ok());
    assert_eq!(ledger.available(), Decimal::ZERO);

    // Even one more kilogram must be refused
    assert_eq!(
        ledger.reserve(OpKind::Expedition, expedition_b, dec("1")),
        Err(LedgerError::Insufficient)
    );

    // Reversing the consolidation frees exactly its 300 kg
    ledger.release(OpKind::Consolidation, consolidation).unwrap();
    assert_eq!(ledger.available(), dec("300"));
}

// ============================================================================
// Property-Based Tests
// ============================================================================

/// Reservation amounts in hundredths of a kilogram, 0.01 to 200.00
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1..=20_000i64).prop_map(|n| Decimal::new(n, 2))
}

proptest! {
    /// Conservation: no sequence of reservation attempts ever pushes
    /// consumed past the reception quantity
    #[test]
    fn consumed_never_exceeds_quantity(
        amounts in prop::collection::vec(amount_strategy(), 1..50)
    ) {
        let quantity = dec("1000");
        let mut ledger = LedgerModel::approved(quantity);

        for amount in amounts {
            let _ = ledger.reserve(OpKind::Consolidation, Uuid::new_v4(), amount);
            prop_assert!(ledger.consumed() <= quantity);
            prop_assert!(ledger.available() >= Decimal::ZERO);
        }
    }

    /// Reserve then release leaves the ledger exactly where it started
    #[test]
    fn reserve_release_is_identity(
        amounts in prop::collection::vec(amount_strategy(), 1..10)
    ) {
        let mut ledger = LedgerModel::approved(dec("100000"));
        let op = Uuid::new_v4();

        for amount in &amounts {
            ledger.reserve(OpKind::Consolidation, op, *amount).unwrap();
        }
        let total: Decimal = amounts.iter().sum();
        prop_assert_eq!(ledger.consumed(), total);

        ledger.release(OpKind::Consolidation, op).unwrap();
        prop_assert_eq!(ledger.consumed(), Decimal::ZERO);
        prop_assert_eq!(ledger.available(), dec("100000"));
    }

    /// A reservation either commits in full or changes nothing
    #[test]
    fn failed_reservation_changes_nothing(
        quantity in 1..=1000i64,
        amount in 1..=2000i64,
    ) {
        let quantity = Decimal::from(quantity);
        let amount = Decimal::from(amount);
        let mut ledger = LedgerModel::approved(quantity);

        let before = ledger.consumed();
        match ledger.reserve(OpKind::Expedition, Uuid::new_v4(), amount) {
            Ok(new_consumed) => prop_assert_eq!(new_consumed, before + amount),
            Err(_) => prop_assert_eq!(ledger.consumed(), before),
        }
    }
}
