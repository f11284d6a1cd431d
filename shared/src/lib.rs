//! Shared types and models for the Produce Traceability Platform
//!
//! This crate contains domain models, enums, code generators and validation
//! helpers shared between the backend and other components of the system.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
