//! Business logic services for the Produce Traceability Platform

pub mod certification;
pub mod consolidation;
pub mod expedition;
pub mod ledger;
pub mod reception;
pub mod storage;
pub mod traceability;

pub use certification::CertificationService;
pub use consolidation::ConsolidationService;
pub use expedition::ExpeditionService;
pub use ledger::LotLedger;
pub use reception::ReceptionService;
pub use storage::StorageService;
pub use traceability::TraceabilityService;
