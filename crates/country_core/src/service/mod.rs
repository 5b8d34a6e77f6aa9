//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Turn repository absence signals into semantic service errors.

pub mod country_service;
