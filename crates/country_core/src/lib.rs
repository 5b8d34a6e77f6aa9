//! Core domain logic for the country information service.
//! This crate is the single source of truth for country data access.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::country::{
    Country, CountryId, CountryPatch, CountryValidationError, NewCountry, MAX_POPULATION,
};
pub use repo::country_repo::{
    CountryRepository, CountrySearch, CountryStatistics, Pagination, RepoError, RepoResult,
    SqliteCountryRepository, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
pub use seed::{sample_countries, seed_sample_countries, SeedOutcome};
pub use service::country_service::{CountryService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
