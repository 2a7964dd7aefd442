use std::collections::BTreeMap;
use std::io::Read;

use rent_core::{RentRepository, RepositoryError, ScheduleError, TaxBracket, TaxLevel, TaxSchedule};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when loading tax bracket data.
#[derive(Debug, Error)]
pub enum BracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid {level} schedule for {region} {tax_year}: {source}")]
    InvalidSchedule {
        tax_year: i32,
        region: String,
        level: TaxLevel,
        source: ScheduleError,
    },

    #[error(
        "No {level} settings for {region} {tax_year} in database (have you run the seeds?)"
    )]
    SettingsNotFound {
        tax_year: i32,
        region: String,
        level: TaxLevel,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for BracketLoaderError {
    fn from(err: csv::Error) -> Self {
        BracketLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the tax brackets CSV file.
///
/// - `tax_year`: The tax year (e.g., 2025)
/// - `region`: `CA` for the federal table, otherwise a province code
/// - `level`: `federal` or `provincial`
/// - `min_income`: Lower bound of the band
/// - `max_income`: Upper bound of the band (empty for unbounded)
/// - `rate`: The marginal tax rate as a decimal (e.g., 0.0506)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub tax_year: i32,
    pub region: String,
    #[serde(deserialize_with = "deserialize_level")]
    pub level: TaxLevel,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_level<'de, D>(deserializer: D) -> Result<TaxLevel, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    TaxLevel::parse(s.trim()).ok_or_else(|| {
        serde::de::Error::custom(format!(
            "invalid level '{}', expected 'federal' or 'provincial'",
            s
        ))
    })
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

type TableKey = (i32, String, TaxLevel);

/// Loader for tax bracket data from CSV files.
///
/// Reads CSV data and writes it through the [`RentRepository`] trait, so it
/// works with any database backend.
pub struct BracketLoader;

impl BracketLoader {
    /// Parse tax bracket records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, BracketLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Load tax bracket records into the database.
    ///
    /// Records are grouped by (tax_year, region, level). Every group is
    /// validated as a [`TaxSchedule`] and checked against the stored level
    /// settings before anything is written, so a file with an invalid table
    /// or unknown settings leaves the database untouched. Each table is then
    /// replaced wholesale, which makes repeated loads of the same file
    /// idempotent. Writes are not transactional: a repository error after a
    /// table's delete leaves that table partly written, and loading it
    /// afterwards fails validation until the file is loaded again.
    pub async fn load<R: RentRepository + ?Sized>(
        repo: &R,
        records: &[BracketRecord],
    ) -> Result<usize, BracketLoaderError> {
        let tables = Self::group(records)?;

        for (tax_year, region, level) in tables.keys() {
            repo.get_level_settings(*tax_year, region, *level)
                .await
                .map_err(|e| match e {
                    RepositoryError::NotFound => BracketLoaderError::SettingsNotFound {
                        tax_year: *tax_year,
                        region: region.clone(),
                        level: *level,
                    },
                    other => BracketLoaderError::Repository(other),
                })?;
        }

        let mut inserted = 0;
        for ((tax_year, region, level), schedule) in &tables {
            debug!(tax_year, region = %region, level = level.as_str(), "replacing bracket table");
            repo.delete_tax_brackets(*tax_year, region, *level).await?;

            for bracket in schedule.brackets() {
                repo.insert_tax_bracket(*tax_year, region, *level, bracket)
                    .await?;
                inserted += 1;
            }
        }

        info!(tables = tables.len(), brackets = inserted, "bracket tables loaded");
        Ok(inserted)
    }

    /// Groups records into tables ordered by lower bound and validates each.
    fn group(records: &[BracketRecord]) -> Result<BTreeMap<TableKey, TaxSchedule>, BracketLoaderError> {
        let mut groups: BTreeMap<TableKey, Vec<TaxBracket>> = BTreeMap::new();

        for record in records {
            groups
                .entry((record.tax_year, record.region.trim().to_string(), record.level))
                .or_default()
                .push(TaxBracket::new(record.min_income, record.max_income, record.rate));
        }

        groups
            .into_iter()
            .map(|((tax_year, region, level), mut brackets)| {
                brackets.sort_by(|a, b| a.min_income.cmp(&b.min_income));
                match TaxSchedule::new(brackets) {
                    Ok(schedule) => Ok(((tax_year, region, level), schedule)),
                    Err(source) => Err(BracketLoaderError::InvalidSchedule {
                        tax_year,
                        region,
                        level,
                        source,
                    }),
                }
            })
            .collect()
    }
}
