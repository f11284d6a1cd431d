//! HTTP handlers for the Produce Traceability Platform

mod certification;
mod consolidation;
mod expedition;
mod health;
mod reception;
mod storage;
mod traceability;

pub use certification::*;
pub use consolidation::*;
pub use expedition::*;
pub use health::*;
pub use reception::*;
pub use storage::*;
pub use traceability::*;
