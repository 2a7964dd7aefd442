//! Integration tests for bracket loading against the SQLite backend.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rent_core::calculations::compute_take_home;
use rent_core::{CreditRate, JurisdictionTaxConfig, LevelSettings, RentRepository, TaxLevel};
use rent_data::{BracketLoader, BracketLoaderError};
use rent_db_sqlite::SqliteRepository;
use rust_decimal_macros::dec;
use sqlx::sqlite::SqlitePoolOptions;

const TEST_CSV_2025: &str = include_str!("../test-data/tax_brackets_2025.csv");

/// Migrations only; simulates running `--migrate` without `--seeds`.
async fn setup_test_db_without_seeds() -> SqliteRepository {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    let repo = SqliteRepository::new_with_pool(pool).await;
    repo.run_migrations()
        .await
        .expect("Failed to run migrations");

    repo
}

/// Reference seeds plus Ontario provincial settings.
async fn setup_test_db() -> SqliteRepository {
    let repo = setup_test_db_without_seeds().await;

    let seeds = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../rent-db-sqlite/seeds");
    repo.run_seeds(&seeds).await.expect("Failed to run seeds");

    repo.upsert_level_settings(&LevelSettings {
        tax_year: 2025,
        region: "ON".to_string(),
        level: TaxLevel::Provincial,
        basic_personal_amount: dec!(12747),
        credit_rate: CreditRate::LowestBracket,
    })
    .await
    .expect("Failed to insert Ontario settings");

    repo
}

#[tokio::test]
async fn test_load_all_2025_brackets() {
    let repo = setup_test_db().await;

    let records = BracketLoader::parse(TEST_CSV_2025.as_bytes()).expect("Failed to parse CSV");
    let inserted = BracketLoader::load(&repo, &records)
        .await
        .expect("Failed to load brackets");

    // 5 federal + 7 BC + 5 ON
    assert_eq!(inserted, 17);
}

#[tokio::test]
async fn test_load_and_retrieve_ontario_brackets() {
    let repo = setup_test_db().await;

    let records = BracketLoader::parse(TEST_CSV_2025.as_bytes()).expect("Failed to parse CSV");
    BracketLoader::load(&repo, &records)
        .await
        .expect("Failed to load brackets");

    let brackets = repo
        .get_tax_brackets(2025, "ON", TaxLevel::Provincial)
        .await
        .expect("Failed to get Ontario brackets");

    assert_eq!(brackets.len(), 5);
    assert_eq!(brackets[0].min_income, dec!(0));
    assert_eq!(brackets[0].max_income, Some(dec!(52886)));
    assert_eq!(brackets[0].tax_rate, dec!(0.0505));
    assert_eq!(brackets[4].min_income, dec!(220000));
    assert_eq!(brackets[4].max_income, None);
    assert_eq!(brackets[4].tax_rate, dec!(0.1316));

    let regions = repo.list_regions(2025).await.expect("Failed to list regions");
    assert_eq!(regions, vec!["BC".to_string(), "ON".to_string()]);
}

#[tokio::test]
async fn test_loaded_reference_tables_match_builtin_config() {
    let repo = setup_test_db().await;

    let records = BracketLoader::parse(TEST_CSV_2025.as_bytes()).expect("Failed to parse CSV");
    BracketLoader::load(&repo, &records)
        .await
        .expect("Failed to load brackets");

    let config = repo
        .load_jurisdiction_config(2025, "BC")
        .await
        .expect("Failed to load BC config");

    assert_eq!(config, JurisdictionTaxConfig::reference());
    let result = compute_take_home(dec!(75000), &config);
    assert_eq!(result.total_tax, dec!(13673));
    assert_eq!(result.monthly_take_home, dec!(5111));
}

#[tokio::test]
async fn test_load_is_idempotent() {
    let repo = setup_test_db().await;

    let records = BracketLoader::parse(TEST_CSV_2025.as_bytes()).expect("Failed to parse CSV");

    BracketLoader::load(&repo, &records)
        .await
        .expect("First load failed");
    BracketLoader::load(&repo, &records)
        .await
        .expect("Second load failed");

    let federal = repo
        .get_tax_brackets(2025, "CA", TaxLevel::Federal)
        .await
        .expect("Failed to get federal brackets");
    assert_eq!(federal.len(), 5);

    let bc = repo
        .get_tax_brackets(2025, "BC", TaxLevel::Provincial)
        .await
        .expect("Failed to get BC brackets");
    assert_eq!(bc.len(), 7);
}

#[tokio::test]
async fn test_load_replaces_existing_table() {
    let repo = setup_test_db().await;

    let csv = "tax_year,region,level,min_income,max_income,rate
2025,BC,provincial,0,50000,0.05
2025,BC,provincial,50000,,0.10
";
    let records = BracketLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");
    BracketLoader::load(&repo, &records)
        .await
        .expect("Failed to load brackets");

    let bc = repo
        .get_tax_brackets(2025, "BC", TaxLevel::Provincial)
        .await
        .expect("Failed to get BC brackets");
    assert_eq!(bc.len(), 2);

    // Untouched tables survive.
    let federal = repo
        .get_tax_brackets(2025, "CA", TaxLevel::Federal)
        .await
        .expect("Failed to get federal brackets");
    assert_eq!(federal.len(), 5);
}

#[tokio::test]
async fn test_load_without_settings_fails() {
    let repo = setup_test_db_without_seeds().await;

    let records = BracketLoader::parse(TEST_CSV_2025.as_bytes()).expect("Failed to parse CSV");
    let result = BracketLoader::load(&repo, &records).await;

    match result {
        Err(BracketLoaderError::SettingsNotFound {
            tax_year, level, ..
        }) => {
            assert_eq!(tax_year, 2025);
            // Tables are checked in key order; "BC" sorts first.
            assert_eq!(level, TaxLevel::Provincial);
        }
        other => panic!("expected SettingsNotFound, got {other:?}"),
    }

    let brackets = repo
        .get_tax_brackets(2025, "CA", TaxLevel::Federal)
        .await
        .expect("Query should succeed");
    assert!(brackets.is_empty());
}

#[tokio::test]
async fn test_invalid_table_leaves_database_untouched() {
    let repo = setup_test_db().await;

    // Valid ON table followed by a BC table with a gap.
    let csv = "tax_year,region,level,min_income,max_income,rate
2025,ON,provincial,0,,0.0505
2025,BC,provincial,0,40000,0.0506
2025,BC,provincial,47937,,0.077
";
    let records = BracketLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");
    let result = BracketLoader::load(&repo, &records).await;

    assert!(matches!(
        result,
        Err(BracketLoaderError::InvalidSchedule { ref region, .. }) if region == "BC"
    ));

    let on = repo
        .get_tax_brackets(2025, "ON", TaxLevel::Provincial)
        .await
        .expect("Query should succeed");
    assert!(on.is_empty());

    let bc = repo
        .get_tax_brackets(2025, "BC", TaxLevel::Provincial)
        .await
        .expect("Query should succeed");
    assert_eq!(bc.len(), 7);
}
