//! Country domain model.
//!
//! # Responsibility
//! - Define the stored `Country` record, the `NewCountry` create payload and
//!   the `CountryPatch` partial-update payload.
//! - Validate write payloads before they reach storage.
//!
//! # Invariants
//! - `id` is assigned by the store and never reused.
//! - `name` is non-blank and at most [`MAX_NAME_CHARS`] characters.
//! - `population` is within `0..=MAX_POPULATION` and `area` is non-negative
//!   when present.
//! - `created_at`/`updated_at` are opaque caller-supplied metadata.

use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned identifier of a country row.
pub type CountryId = i64;

/// Upper bound for `name`, mirrored from the storage column width.
pub const MAX_NAME_CHARS: usize = 100;

/// Upper bound for `population`. Keeps the integer sum behind statistics
/// below `i64::MAX` for up to ~92 million rows.
pub const MAX_POPULATION: i64 = 100_000_000_000;

/// Stored country record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    /// Unique human-readable key, matched case-sensitively by name lookup.
    pub name: String,
    pub capital: Option<String>,
    pub population: Option<i64>,
    pub region: Option<String>,
    pub subregion: Option<String>,
    /// Square kilometers.
    pub area: Option<f64>,
    pub flag_url: Option<String>,
    pub interesting_fact: Option<String>,
    pub currency: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub is_independent: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Country {
    /// Validates the mutable attributes of a stored record.
    pub fn validate(&self) -> Result<(), CountryValidationError> {
        validate_fields(&self.name, self.population, self.area)
    }
}

/// Create payload: every attribute of [`Country`] except the identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCountry {
    pub name: String,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub population: Option<i64>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub subregion: Option<String>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub flag_url: Option<String>,
    #[serde(default)]
    pub interesting_fact: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    /// Missing or `null` both mean independent.
    #[serde(
        default = "independent_by_default",
        deserialize_with = "independent_or_default"
    )]
    pub is_independent: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl NewCountry {
    /// Creates a payload with only `name` set and every optional attribute empty.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capital: None,
            population: None,
            region: None,
            subregion: None,
            area: None,
            flag_url: None,
            interesting_fact: None,
            currency: None,
            language: None,
            timezone: None,
            is_independent: true,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), CountryValidationError> {
        validate_fields(&self.name, self.population, self.area)
    }
}

/// Partial update payload.
///
/// Each nullable attribute carries presence explicitly:
/// - `None`: not supplied, the stored value is kept.
/// - `Some(None)`: supplied as `null`, the stored value is cleared.
/// - `Some(Some(v))`: supplied, the stored value becomes `v`.
///
/// `name` and `is_independent` cannot be cleared, so they are plain options
/// and a JSON `null` for them reads as "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "supplied", skip_serializing_if = "Option::is_none")]
    pub capital: Option<Option<String>>,
    #[serde(default, deserialize_with = "supplied", skip_serializing_if = "Option::is_none")]
    pub population: Option<Option<i64>>,
    #[serde(default, deserialize_with = "supplied", skip_serializing_if = "Option::is_none")]
    pub region: Option<Option<String>>,
    #[serde(default, deserialize_with = "supplied", skip_serializing_if = "Option::is_none")]
    pub subregion: Option<Option<String>>,
    #[serde(default, deserialize_with = "supplied", skip_serializing_if = "Option::is_none")]
    pub area: Option<Option<f64>>,
    #[serde(default, deserialize_with = "supplied", skip_serializing_if = "Option::is_none")]
    pub flag_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "supplied", skip_serializing_if = "Option::is_none")]
    pub interesting_fact: Option<Option<String>>,
    #[serde(default, deserialize_with = "supplied", skip_serializing_if = "Option::is_none")]
    pub currency: Option<Option<String>>,
    #[serde(default, deserialize_with = "supplied", skip_serializing_if = "Option::is_none")]
    pub language: Option<Option<String>>,
    #[serde(default, deserialize_with = "supplied", skip_serializing_if = "Option::is_none")]
    pub timezone: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_independent: Option<bool>,
    #[serde(default, deserialize_with = "supplied", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Option<String>>,
    #[serde(default, deserialize_with = "supplied", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Option<String>>,
}

impl CountryPatch {
    /// Returns whether no attribute was supplied.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Overwrites exactly the supplied attributes of `country`.
    ///
    /// `id` is never touched.
    pub fn apply_to(self, country: &mut Country) {
        if let Some(name) = self.name {
            country.name = name;
        }
        if let Some(value) = self.capital {
            country.capital = value;
        }
        if let Some(value) = self.population {
            country.population = value;
        }
        if let Some(value) = self.region {
            country.region = value;
        }
        if let Some(value) = self.subregion {
            country.subregion = value;
        }
        if let Some(value) = self.area {
            country.area = value;
        }
        if let Some(value) = self.flag_url {
            country.flag_url = value;
        }
        if let Some(value) = self.interesting_fact {
            country.interesting_fact = value;
        }
        if let Some(value) = self.currency {
            country.currency = value;
        }
        if let Some(value) = self.language {
            country.language = value;
        }
        if let Some(value) = self.timezone {
            country.timezone = value;
        }
        if let Some(value) = self.is_independent {
            country.is_independent = value;
        }
        if let Some(value) = self.created_at {
            country.created_at = value;
        }
        if let Some(value) = self.updated_at {
            country.updated_at = value;
        }
    }
}

/// Write-payload validation failures.
#[derive(Debug, Clone, PartialEq)]
pub enum CountryValidationError {
    BlankName,
    NameTooLong { chars: usize, max: usize },
    NegativePopulation(i64),
    PopulationTooLarge { value: i64, max: i64 },
    InvalidArea(f64),
}

impl Display for CountryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "country name must not be blank"),
            Self::NameTooLong { chars, max } => {
                write!(f, "country name has {chars} characters, at most {max} allowed")
            }
            Self::NegativePopulation(value) => {
                write!(f, "population must be non-negative, got {value}")
            }
            Self::PopulationTooLarge { value, max } => {
                write!(f, "population must be at most {max}, got {value}")
            }
            Self::InvalidArea(value) => {
                write!(f, "area must be a finite non-negative number, got {value}")
            }
        }
    }
}

impl Error for CountryValidationError {}

fn validate_fields(
    name: &str,
    population: Option<i64>,
    area: Option<f64>,
) -> Result<(), CountryValidationError> {
    if name.trim().is_empty() {
        return Err(CountryValidationError::BlankName);
    }
    let chars = name.chars().count();
    if chars > MAX_NAME_CHARS {
        return Err(CountryValidationError::NameTooLong {
            chars,
            max: MAX_NAME_CHARS,
        });
    }
    if let Some(value) = population.filter(|value| *value < 0) {
        return Err(CountryValidationError::NegativePopulation(value));
    }
    if let Some(value) = population.filter(|value| *value > MAX_POPULATION) {
        return Err(CountryValidationError::PopulationTooLarge {
            value,
            max: MAX_POPULATION,
        });
    }
    if let Some(value) = area.filter(|value| !value.is_finite() || *value < 0.0) {
        return Err(CountryValidationError::InvalidArea(value));
    }
    Ok(())
}

fn independent_by_default() -> bool {
    true
}

fn independent_or_default<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

// Only runs when the key is present, so `null` becomes `Some(None)`.
fn supplied<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
