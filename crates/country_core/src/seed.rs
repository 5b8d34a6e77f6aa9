//! One-time population of an empty store with reference countries.
//!
//! # Invariants
//! - Seeding never touches a store that already holds rows.
//! - All sample rows are inserted in one transaction; a failure leaves the
//!   store empty.

use crate::model::country::NewCountry;
use crate::repo::country_repo::{CountryRepository, RepoResult, SqliteCountryRepository};
use log::info;
use rusqlite::Connection;

/// Result of [`seed_sample_countries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Store already had `existing` rows; nothing was written.
    Skipped { existing: u64 },
    /// `inserted` sample rows were created.
    Seeded { inserted: usize },
}

/// Inserts [`sample_countries`] when the `countries` table is empty.
pub fn seed_sample_countries(conn: &Connection) -> RepoResult<SeedOutcome> {
    let tx = conn.unchecked_transaction()?;
    let repo = SqliteCountryRepository::try_new(&tx)?;

    let existing = repo.count_countries()?;
    if existing > 0 {
        info!("event=seed module=seed status=skipped existing={existing}");
        return Ok(SeedOutcome::Skipped { existing });
    }

    let samples = sample_countries();
    for country in &samples {
        repo.create_country(country)?;
    }
    tx.commit()?;

    info!("event=seed module=seed status=ok inserted={}", samples.len());
    Ok(SeedOutcome::Seeded {
        inserted: samples.len(),
    })
}

/// Reference records used by the seed loader and by tests.
pub fn sample_countries() -> Vec<NewCountry> {
    vec![
        sample(
            "Nepal",
            "Kathmandu",
            29_609_623,
            ("Asia", "Southern Asia"),
            147_181.0,
            "np",
            "Nepal is home to Mount Everest, the tallest mountain in the world, standing at 8,848 meters.",
            ("Nepalese Rupee", "Nepali", "UTC+05:45"),
        ),
        sample(
            "Egypt",
            "Cairo",
            104_258_327,
            ("Africa", "Northern Africa"),
            1_001_449.0,
            "eg",
            "The Pyramids of Giza are one of the Seven Wonders of the Ancient World.",
            ("Egyptian Pound", "Arabic", "UTC+02:00"),
        ),
        sample(
            "Australia",
            "Canberra",
            25_687_041,
            ("Oceania", "Australia and New Zealand"),
            7_692_024.0,
            "au",
            "Australia is home to the Great Barrier Reef, the largest coral reef system in the world.",
            ("Australian Dollar", "English", "UTC+10:00"),
        ),
        sample(
            "Brazil",
            "Brasilia",
            213_993_437,
            ("Americas", "South America"),
            8_514_877.0,
            "br",
            "Brazil is home to the Amazon Rainforest, the largest tropical rainforest in the world.",
            ("Brazilian Real", "Portuguese", "UTC-03:00"),
        ),
        sample(
            "France",
            "Paris",
            67_407_241,
            ("Europe", "Western Europe"),
            551_695.0,
            "fr",
            "The Eiffel Tower in Paris was once the tallest man-made structure in the world.",
            ("Euro", "French", "UTC+01:00"),
        ),
        sample(
            "Russia",
            "Moscow",
            1_324_216_107,
            ("Europe", "Eastern Europe"),
            17_098_242.0,
            "ru",
            "Russia is the largest country in the world by area, covering more than 17 million square kilometers.",
            ("Russian Ruble", "Russian", "UTC+03:00"),
        ),
        sample(
            "China",
            "Beijing",
            1_444_216_107,
            ("Asia", "Eastern Asia"),
            9_596_961.0,
            "cn",
            "The Great Wall of China is visible from space on rare occasions.",
            ("Chinese Yuan", "Chinese", "UTC+08:00"),
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn sample(
    name: &str,
    capital: &str,
    population: i64,
    (region, subregion): (&str, &str),
    area: f64,
    flag_code: &str,
    fact: &str,
    (currency, language, timezone): (&str, &str, &str),
) -> NewCountry {
    NewCountry {
        capital: Some(capital.to_string()),
        population: Some(population),
        region: Some(region.to_string()),
        subregion: Some(subregion.to_string()),
        area: Some(area),
        flag_url: Some(format!("https://flagcdn.com/w320/{flag_code}.png")),
        interesting_fact: Some(fact.to_string()),
        currency: Some(currency.to_string()),
        language: Some(language.to_string()),
        timezone: Some(timezone.to_string()),
        ..NewCountry::new(name)
    }
}
