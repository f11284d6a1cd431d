//! Traceability resolver tests
//!
//! Forward traces list allocations date-ascending; reversed allocations are
//! excluded unless the forensic flag is set.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::models::AllocationStatus;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn at(hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::hours(hours)
}

// ============================================================================
// In-memory trace model (mirrors services/traceability.rs filtering)
// ============================================================================

#[derive(Debug, Clone)]
struct AllocationRecord {
    operation_id: Uuid,
    allocation_type: &'static str,
    quantity_kg: Decimal,
    allocation_date: DateTime<Utc>,
    status: AllocationStatus,
}

fn trace_forward(
    records: &[AllocationRecord],
    include_inactive: bool,
) -> Vec<AllocationRecord> {
    let mut entries: Vec<AllocationRecord> = records
        .iter()
        .filter(|r| include_inactive || r.status == AllocationStatus::Active)
        .cloned()
        .collect();
    entries.sort_by_key(|r| r.allocation_date);
    entries
}

fn sample_records() -> Vec<AllocationRecord> {
    vec![
        AllocationRecord {
            operation_id: Uuid::from_u128(2),
            allocation_type: "expedition",
            quantity_kg: dec("200"),
            allocation_date: at(5),
            status: AllocationStatus::Active,
        },
        AllocationRecord {
            operation_id: Uuid::from_u128(1),
            allocation_type: "consolidation",
            quantity_kg: dec("300"),
            allocation_date: at(1),
            status: AllocationStatus::Active,
        },
        AllocationRecord {
            operation_id: Uuid::from_u128(3),
            allocation_type: "consolidation",
            quantity_kg: dec("50"),
            allocation_date: at(3),
            status: AllocationStatus::Inactive,
        },
    ]
}

#[test]
fn forward_trace_is_date_ascending() {
    let entries = trace_forward(&sample_records(), true);
    let dates: Vec<_> = entries.iter().map(|e| e.allocation_date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
}

#[test]
fn forward_trace_excludes_reversed_allocations_by_default() {
    let entries = trace_forward(&sample_records(), false);
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.status == AllocationStatus::Active));
}

#[test]
fn forensic_flag_includes_reversed_allocations() {
    let entries = trace_forward(&sample_records(), true);
    assert_eq!(entries.len(), 3);
    assert!(entries
        .iter()
        .any(|e| e.status == AllocationStatus::Inactive));
}

#[test]
fn forward_trace_spans_both_allocation_kinds() {
    let entries = trace_forward(&sample_records(), false);
    let kinds: Vec<_> = entries.iter().map(|e| e.allocation_type).collect();
    assert!(kinds.contains(&"consolidation"));
    assert!(kinds.contains(&"expedition"));
}

#[test]
fn active_quantities_sum_to_consumed_total() {
    // The forward trace of a reception accounts for exactly the consumed
    // quantity: 300 kg consolidated plus 200 kg expedited
    let total: Decimal = trace_forward(&sample_records(), false)
        .iter()
        .map(|e| e.quantity_kg)
        .sum();
    assert_eq!(total, dec("500"));
}

#[test]
fn operation_ids_survive_the_trace() {
    let entries = trace_forward(&sample_records(), false);
    assert_eq!(entries[0].operation_id, Uuid::from_u128(1));
    assert_eq!(entries[1].operation_id, Uuid::from_u128(2));
}
