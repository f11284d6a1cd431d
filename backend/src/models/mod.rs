//! Database models for the Produce Traceability Platform
//!
//! Re-exports models from the shared crate; backend services define their
//! own row and input types next to the SQL that produces them.

pub use shared::models::*;
