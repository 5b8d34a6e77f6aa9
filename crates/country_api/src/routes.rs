//! Country request handlers.
//!
//! Each handler validates its input, opens a fresh store connection on the
//! blocking pool and maps service outcomes to HTTP responses.

use crate::error::{ApiError, ApiResult};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use country_core::db::open_db;
use country_core::{
    core_version, Country, CountryId, CountryPatch, CountrySearch, CountryService,
    CountryStatistics, NewCountry, Pagination, SqliteCountryRepository, DEFAULT_PAGE_LIMIT,
    MAX_PAGE_LIMIT,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

type Service<'conn> = CountryService<SqliteCountryRepository<'conn>>;

/// Shared handler state: where the store lives, nothing more.
#[derive(Debug, Clone)]
pub struct AppState {
    database_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: Arc::new(database_path.into()),
        }
    }

    /// Runs `op` against a per-call connection on the blocking pool.
    async fn run<T, F>(&self, op: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: for<'conn> FnOnce(&Service<'conn>) -> ApiResult<T> + Send + 'static,
    {
        let path = Arc::clone(&self.database_path);
        tokio::task::spawn_blocking(move || {
            let conn = open_db(path.as_path())?;
            let service = CountryService::new(SqliteCountryRepository::try_new(&conn)?);
            op(&service)
        })
        .await
        .map_err(|err| ApiError::Internal(format!("blocking task failed: {err}")))?
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
    pub region: Option<String>,
    pub capital: Option<String>,
    pub min_population: Option<i64>,
    pub max_population: Option<i64>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl SearchParams {
    /// Whitespace-only text criteria are dropped; every other value, and every
    /// numeric bound including zero, reaches the store unchanged.
    fn criteria(&self) -> ApiResult<CountrySearch> {
        Ok(CountrySearch {
            name: non_blank(&self.name),
            region: non_blank(&self.region),
            capital: non_blank(&self.capital),
            min_population: non_negative("min_population", self.min_population)?,
            max_population: non_negative("max_population", self.max_population)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: core_version().to_string(),
    })
}

pub async fn list_countries(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Country>>> {
    let Query(params) = params?;
    let page = pagination(params.skip, params.limit)?;
    let countries = state
        .run(move |service| Ok(service.list_countries(page)?))
        .await?;
    Ok(Json(countries))
}

pub async fn search_countries(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Country>>> {
    let Query(params) = params?;
    let criteria = params.criteria()?;
    let page = pagination(params.skip, params.limit)?;
    let countries = state
        .run(move |service| Ok(service.search_countries(&criteria, page)?))
        .await?;
    Ok(Json(countries))
}

pub async fn get_country(
    State(state): State<AppState>,
    id: Result<Path<CountryId>, PathRejection>,
) -> ApiResult<Json<Country>> {
    let Path(id) = id?;
    let country = state.run(move |service| Ok(service.country(id)?)).await?;
    Ok(Json(country))
}

pub async fn get_country_by_name(
    State(state): State<AppState>,
    name: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Country>> {
    let Path(name) = name?;
    let country = state
        .run(move |service| Ok(service.country_by_name(&name)?))
        .await?;
    Ok(Json(country))
}

pub async fn countries_in_region(
    State(state): State<AppState>,
    region: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Vec<Country>>> {
    let Path(region) = region?;
    let countries = state
        .run(move |service| Ok(service.countries_in_region(&region)?))
        .await?;
    Ok(Json(countries))
}

pub async fn country_statistics(
    State(state): State<AppState>,
) -> ApiResult<Json<CountryStatistics>> {
    let stats = state.run(|service| Ok(service.statistics()?)).await?;
    Ok(Json(stats))
}

pub async fn create_country(
    State(state): State<AppState>,
    payload: Result<Json<NewCountry>, JsonRejection>,
) -> ApiResult<Json<Country>> {
    let Json(payload) = payload?;
    payload
        .validate()
        .map_err(|err| ApiError::Validation(err.to_string()))?;
    let created = state
        .run(move |service| Ok(service.register_country(&payload)?))
        .await?;
    Ok(Json(created))
}

pub async fn update_country(
    State(state): State<AppState>,
    id: Result<Path<CountryId>, PathRejection>,
    patch: Result<Json<CountryPatch>, JsonRejection>,
) -> ApiResult<Json<Country>> {
    let Path(id) = id?;
    let Json(patch) = patch?;
    let updated = state
        .run(move |service| Ok(service.update_country(id, patch)?))
        .await?;
    Ok(Json(updated))
}

pub async fn delete_country(
    State(state): State<AppState>,
    id: Result<Path<CountryId>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = id?;
    state
        .run(move |service| Ok(service.remove_country(id)?))
        .await?;
    Ok(Json(MessageResponse {
        message: "Country deleted successfully".to_string(),
    }))
}

fn pagination(skip: Option<i64>, limit: Option<i64>) -> ApiResult<Pagination> {
    let skip = match skip {
        None => 0,
        Some(value) => u32::try_from(value).map_err(|_| {
            ApiError::Validation(format!("skip must be between 0 and {}, got {value}", u32::MAX))
        })?,
    };
    let limit = match limit {
        None => DEFAULT_PAGE_LIMIT,
        Some(value) => u32::try_from(value)
            .ok()
            .filter(|limit| (1..=MAX_PAGE_LIMIT).contains(limit))
            .ok_or_else(|| {
                ApiError::Validation(format!(
                    "limit must be between 1 and {MAX_PAGE_LIMIT}, got {value}"
                ))
            })?,
    };
    Ok(Pagination::new(skip, limit))
}

fn non_negative(field: &str, value: Option<i64>) -> ApiResult<Option<i64>> {
    match value {
        Some(bound) if bound < 0 => Err(ApiError::Validation(format!(
            "{field} must be non-negative, got {bound}"
        ))),
        other => Ok(other),
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .filter(|text| !text.trim().is_empty())
        .cloned()
}
