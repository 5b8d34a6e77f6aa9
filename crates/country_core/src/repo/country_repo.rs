//! Country repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, filtered search and aggregate statistics over `countries`.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `list_countries` and `search_countries` order by `id ASC`.
//! - A search with no criteria is exactly a list.
//! - Population bounds of `0` are active filters; only `None` disables one.
//! - Partial updates read, merge, validate and write inside one transaction.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::country::{Country, CountryId, CountryPatch, CountryValidationError, NewCountry};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const COUNTRIES_TABLE: &str = "countries";

const COUNTRY_COLUMNS: &[&str] = &[
    "id",
    "name",
    "capital",
    "population",
    "region",
    "subregion",
    "area",
    "flag_url",
    "interesting_fact",
    "currency",
    "language",
    "timezone",
    "is_independent",
    "created_at",
    "updated_at",
];

const COUNTRY_SELECT_SQL: &str = "SELECT
    id,
    name,
    capital,
    population,
    region,
    subregion,
    area,
    flag_url,
    interesting_fact,
    currency,
    language,
    timezone,
    is_independent,
    created_at,
    updated_at
FROM countries";

/// Default page size for list/search callers that do not pick one.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;
/// Largest page size the HTTP layer accepts.
pub const MAX_PAGE_LIMIT: u32 = 1000;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for country persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(CountryValidationError),
    Db(DbError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted country data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<CountryValidationError> for RepoError {
    fn from(value: CountryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Offset/limit window for list and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub skip: u32,
    pub limit: u32,
}

impl Pagination {
    pub fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Optional search criteria, combined with logical AND.
///
/// `None` imposes no constraint. Any `Some` value is applied, including
/// empty strings and zero population bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountrySearch {
    /// Case-insensitive substring of `name`.
    pub name: Option<String>,
    /// Exact `region`.
    pub region: Option<String>,
    /// Case-insensitive substring of `capital`.
    pub capital: Option<String>,
    /// Inclusive lower population bound.
    pub min_population: Option<i64>,
    /// Inclusive upper population bound.
    pub max_population: Option<i64>,
}

/// Aggregate overview of the whole store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryStatistics {
    pub total_countries: u64,
    /// Distinct non-empty regions, sorted ascending.
    pub regions: Vec<String>,
    /// Sum over countries with a known population.
    pub total_population: i64,
    /// `total_population` divided by the number of countries with a known
    /// population, or `0` when none has one.
    pub average_population: f64,
}

/// Repository interface for country data access.
pub trait CountryRepository {
    fn get_country(&self, id: CountryId) -> RepoResult<Option<Country>>;
    /// Exact, case-sensitive match on `name`.
    fn get_country_by_name(&self, name: &str) -> RepoResult<Option<Country>>;
    fn list_countries(&self, page: Pagination) -> RepoResult<Vec<Country>>;
    fn search_countries(
        &self,
        criteria: &CountrySearch,
        page: Pagination,
    ) -> RepoResult<Vec<Country>>;
    /// Exact region match, unpaginated.
    fn list_countries_by_region(&self, region: &str) -> RepoResult<Vec<Country>>;
    fn country_statistics(&self) -> RepoResult<CountryStatistics>;
    fn count_countries(&self) -> RepoResult<u64>;
    /// Persists a new row and returns it with the assigned `id`.
    ///
    /// Does not pre-check name uniqueness; callers own that decision.
    fn create_country(&self, country: &NewCountry) -> RepoResult<Country>;
    /// Applies only the supplied fields of `patch`. `None` when `id` is unknown.
    fn update_country(&self, id: CountryId, patch: CountryPatch) -> RepoResult<Option<Country>>;
    /// Returns `true` when a row was removed.
    fn delete_country(&self, id: CountryId) -> RepoResult<bool>;
}

/// SQLite-backed country repository.
pub struct SqliteCountryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCountryRepository<'conn> {
    /// Wraps a connection after checking that its schema is fully migrated.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(conn)?;
        Ok(Self { conn })
    }
}

impl CountryRepository for SqliteCountryRepository<'_> {
    fn get_country(&self, id: CountryId) -> RepoResult<Option<Country>> {
        fetch_country(self.conn, id)
    }

    fn get_country_by_name(&self, name: &str) -> RepoResult<Option<Country>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COUNTRY_SELECT_SQL} WHERE name = ?1;"))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_country_row(row)?));
        }

        Ok(None)
    }

    fn list_countries(&self, page: Pagination) -> RepoResult<Vec<Country>> {
        self.search_countries(&CountrySearch::default(), page)
    }

    fn search_countries(
        &self,
        criteria: &CountrySearch,
        page: Pagination,
    ) -> RepoResult<Vec<Country>> {
        let mut sql = format!("{COUNTRY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(name) = &criteria.name {
            sql.push_str(" AND name LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(contains_pattern(name)));
        }

        if let Some(region) = &criteria.region {
            sql.push_str(" AND region = ?");
            bind_values.push(Value::Text(region.clone()));
        }

        if let Some(capital) = &criteria.capital {
            sql.push_str(" AND capital LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(contains_pattern(capital)));
        }

        if let Some(min_population) = criteria.min_population {
            sql.push_str(" AND population >= ?");
            bind_values.push(Value::Integer(min_population));
        }

        if let Some(max_population) = criteria.max_population {
            sql.push_str(" AND population <= ?");
            bind_values.push(Value::Integer(max_population));
        }

        sql.push_str(" ORDER BY id ASC LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(i64::from(page.limit)));
        bind_values.push(Value::Integer(i64::from(page.skip)));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query(params_from_iter(bind_values))?;
        collect_countries(rows)
    }

    fn list_countries_by_region(&self, region: &str) -> RepoResult<Vec<Country>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COUNTRY_SELECT_SQL} WHERE region = ?1 ORDER BY id ASC;"
        ))?;
        let rows = stmt.query([region])?;
        collect_countries(rows)
    }

    fn country_statistics(&self) -> RepoResult<CountryStatistics> {
        let total_countries = self.count_countries()?;

        let (with_population, total_population): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(population), COALESCE(SUM(population), 0) FROM countries;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT region
             FROM countries
             WHERE region IS NOT NULL AND region <> ''
             ORDER BY region ASC;",
        )?;
        let regions = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let average_population = if with_population == 0 {
            0.0
        } else {
            total_population as f64 / with_population as f64
        };

        Ok(CountryStatistics {
            total_countries,
            regions,
            total_population,
            average_population,
        })
    }

    fn count_countries(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM countries;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn create_country(&self, country: &NewCountry) -> RepoResult<Country> {
        country.validate()?;

        self.conn.execute(
            "INSERT INTO countries (
                name,
                capital,
                population,
                region,
                subregion,
                area,
                flag_url,
                interesting_fact,
                currency,
                language,
                timezone,
                is_independent,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14);",
            params![
                country.name.as_str(),
                country.capital.as_deref(),
                country.population,
                country.region.as_deref(),
                country.subregion.as_deref(),
                country.area,
                country.flag_url.as_deref(),
                country.interesting_fact.as_deref(),
                country.currency.as_deref(),
                country.language.as_deref(),
                country.timezone.as_deref(),
                bool_to_int(country.is_independent),
                country.created_at.as_deref(),
                country.updated_at.as_deref(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        fetch_country(self.conn, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("inserted country {id} could not be read back"))
        })
    }

    fn update_country(&self, id: CountryId, patch: CountryPatch) -> RepoResult<Option<Country>> {
        let tx = self.conn.unchecked_transaction()?;

        let Some(mut country) = fetch_country(&tx, id)? else {
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(country));
        }

        patch.apply_to(&mut country);
        country.validate()?;

        tx.execute(
            "UPDATE countries
             SET
                name = ?1,
                capital = ?2,
                population = ?3,
                region = ?4,
                subregion = ?5,
                area = ?6,
                flag_url = ?7,
                interesting_fact = ?8,
                currency = ?9,
                language = ?10,
                timezone = ?11,
                is_independent = ?12,
                created_at = ?13,
                updated_at = ?14
             WHERE id = ?15;",
            params![
                country.name.as_str(),
                country.capital.as_deref(),
                country.population,
                country.region.as_deref(),
                country.subregion.as_deref(),
                country.area,
                country.flag_url.as_deref(),
                country.interesting_fact.as_deref(),
                country.currency.as_deref(),
                country.language.as_deref(),
                country.timezone.as_deref(),
                bool_to_int(country.is_independent),
                country.created_at.as_deref(),
                country.updated_at.as_deref(),
                country.id,
            ],
        )?;
        tx.commit()?;

        Ok(Some(country))
    }

    fn delete_country(&self, id: CountryId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM countries WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

fn ensure_schema(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
        [COUNTRIES_TABLE],
        |row| row.get(0),
    )?;
    if !table_exists {
        return Err(RepoError::MissingRequiredTable(COUNTRIES_TABLE));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let present = stmt
        .query_map([COUNTRIES_TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(column) = COUNTRY_COLUMNS
        .iter()
        .copied()
        .find(|column| !present.iter().any(|name| name == column))
    {
        return Err(RepoError::MissingRequiredColumn {
            table: COUNTRIES_TABLE,
            column,
        });
    }

    Ok(())
}

fn fetch_country(conn: &Connection, id: CountryId) -> RepoResult<Option<Country>> {
    let mut stmt = conn.prepare(&format!("{COUNTRY_SELECT_SQL} WHERE id = ?1;"))?;
    let country = stmt
        .query_row([id], |row| Ok(parse_country_row(row)))
        .optional()?;
    country.transpose()
}

fn collect_countries(mut rows: rusqlite::Rows<'_>) -> RepoResult<Vec<Country>> {
    let mut countries = Vec::new();
    while let Some(row) = rows.next()? {
        countries.push(parse_country_row(row)?);
    }
    Ok(countries)
}

fn parse_country_row(row: &Row<'_>) -> RepoResult<Country> {
    let id: CountryId = row.get("id")?;
    let is_independent = match row.get::<_, i64>("is_independent")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_independent value `{other}` in countries.is_independent for id {id}"
            )));
        }
    };

    Ok(Country {
        id,
        name: row.get("name")?,
        capital: row.get("capital")?,
        population: row.get("population")?,
        region: row.get("region")?,
        subregion: row.get("subregion")?,
        area: row.get("area")?,
        flag_url: row.get("flag_url")?,
        interesting_fact: row.get("interesting_fact")?,
        currency: row.get("currency")?,
        language: row.get("language")?,
        timezone: row.get("timezone")?,
        is_independent,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Builds a `LIKE` pattern matching `needle` literally anywhere in the value.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn contains_pattern_escapes_like_wildcards() {
        assert_eq!(contains_pattern("pal"), "%pal%");
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
