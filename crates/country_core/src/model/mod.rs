//! Domain model for country records.
//!
//! # Responsibility
//! - Define the stored record and the write payloads used by core logic.
//! - Own field-level validation shared by create and update paths.
//!
//! # Invariants
//! - Every stored country is identified by a store-assigned `CountryId`.
//! - Deletion is permanent; there are no tombstones.

pub mod country;
