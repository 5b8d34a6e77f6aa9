use country_core::db::{open_db, open_db_in_memory};
use country_core::{
    sample_countries, seed_sample_countries, CountryRepository, NewCountry, SeedOutcome,
    SqliteCountryRepository,
};

#[test]
fn seeding_empty_store_inserts_all_samples() {
    let conn = open_db_in_memory().unwrap();

    let outcome = seed_sample_countries(&conn).unwrap();
    assert_eq!(
        outcome,
        SeedOutcome::Seeded {
            inserted: sample_countries().len()
        }
    );

    let repo = SqliteCountryRepository::try_new(&conn).unwrap();
    assert_eq!(repo.count_countries().unwrap(), 7);
    let nepal = repo.get_country_by_name("Nepal").unwrap().unwrap();
    assert_eq!(nepal.population, Some(29_609_623));
    assert_eq!(
        nepal.flag_url.as_deref(),
        Some("https://flagcdn.com/w320/np.png")
    );
    assert_eq!(
        repo.list_countries_by_region("Europe").unwrap().len(),
        2
    );
}

#[test]
fn seeding_populated_store_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("countries.db");

    let conn = open_db(&path).unwrap();
    SqliteCountryRepository::try_new(&conn)
        .unwrap()
        .create_country(&NewCountry::new("Existing"))
        .unwrap();

    let outcome = seed_sample_countries(&conn).unwrap();
    assert_eq!(outcome, SeedOutcome::Skipped { existing: 1 });

    let repo = SqliteCountryRepository::try_new(&conn).unwrap();
    assert_eq!(repo.count_countries().unwrap(), 1);
}

#[test]
fn sample_countries_are_valid_and_uniquely_named() {
    let samples = sample_countries();
    let mut names: Vec<_> = samples.iter().map(|country| country.name.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), samples.len());
    assert!(samples.iter().all(|country| country.validate().is_ok()));
}
