//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the country data-access contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must run model validation before persistence.
//! - Lookups that miss return `None`/`false`, never an error.

pub mod country_repo;
