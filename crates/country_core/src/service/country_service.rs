//! Country use-case service.
//!
//! # Responsibility
//! - Provide the entry points the HTTP handlers call.
//! - Enforce name uniqueness by pre-checking before create.
//! - Map `None`/`false` repository results to `ServiceError::NotFound`.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Two concurrent registrations with the same name can both pass the
//!   pre-check; the store's unique index then rejects the loser as a
//!   storage fault.

use crate::model::country::{Country, CountryId, CountryPatch, NewCountry};
use crate::repo::country_repo::{
    CountryRepository, CountrySearch, CountryStatistics, Pagination, RepoError, RepoResult,
};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for country use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Target country does not exist.
    NotFound(CountryId),
    /// No country carries this exact name.
    NameNotFound(String),
    /// A country with this name already exists.
    AlreadyExists(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "country not found: {id}"),
            Self::NameNotFound(name) => write!(f, "country not found: `{name}`"),
            Self::AlreadyExists(name) => write!(f, "country already exists: `{name}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::NotFound(_) | Self::NameNotFound(_) | Self::AlreadyExists(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service wrapper for country operations.
pub struct CountryService<R: CountryRepository> {
    repo: R,
}

impl<R: CountryRepository> CountryService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Gets one country by id.
    pub fn country(&self, id: CountryId) -> ServiceResult<Country> {
        self.repo
            .get_country(id)?
            .ok_or(ServiceError::NotFound(id))
    }

    /// Gets one country by exact name.
    pub fn country_by_name(&self, name: &str) -> ServiceResult<Country> {
        self.repo
            .get_country_by_name(name)?
            .ok_or_else(|| ServiceError::NameNotFound(name.to_string()))
    }

    pub fn list_countries(&self, page: Pagination) -> RepoResult<Vec<Country>> {
        self.repo.list_countries(page)
    }

    pub fn search_countries(
        &self,
        criteria: &CountrySearch,
        page: Pagination,
    ) -> RepoResult<Vec<Country>> {
        self.repo.search_countries(criteria, page)
    }

    pub fn countries_in_region(&self, region: &str) -> RepoResult<Vec<Country>> {
        self.repo.list_countries_by_region(region)
    }

    pub fn statistics(&self) -> RepoResult<CountryStatistics> {
        self.repo.country_statistics()
    }

    /// Creates a country after checking that its name is free.
    ///
    /// # Contract
    /// - Returns `AlreadyExists` when the exact name is taken.
    /// - Returns the stored record including its assigned id.
    pub fn register_country(&self, country: &NewCountry) -> ServiceResult<Country> {
        if self.repo.get_country_by_name(&country.name)?.is_some() {
            warn!("event=country_create module=service status=rejected reason=name_exists");
            return Err(ServiceError::AlreadyExists(country.name.clone()));
        }

        let created = self.repo.create_country(country)?;
        info!(
            "event=country_create module=service status=ok id={}",
            created.id
        );
        Ok(created)
    }

    /// Applies a partial update by id.
    pub fn update_country(&self, id: CountryId, patch: CountryPatch) -> ServiceResult<Country> {
        let updated = self
            .repo
            .update_country(id, patch)?
            .ok_or(ServiceError::NotFound(id))?;
        info!("event=country_update module=service status=ok id={id}");
        Ok(updated)
    }

    /// Permanently removes a country by id.
    pub fn remove_country(&self, id: CountryId) -> ServiceResult<()> {
        if !self.repo.delete_country(id)? {
            return Err(ServiceError::NotFound(id));
        }
        info!("event=country_delete module=service status=ok id={id}");
        Ok(())
    }
}
