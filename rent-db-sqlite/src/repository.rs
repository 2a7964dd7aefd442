use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rent_core::{
    CreditRate, HouseholdMember, LevelSettings, NewHouseholdMember, RentRepository,
    RepositoryError, TaxBracket, TaxLevel,
};
use sqlx::{
    Row,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use tracing::debug;

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

const CREDIT_KIND_FIXED: &str = "fixed";
const CREDIT_KIND_LOWEST_BRACKET: &str = "lowest_bracket";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `database_url`, creating the file if it does not exist.
    ///
    /// Accepts a bare path, a `sqlite:` URL or `:memory:`. An in-memory
    /// database is pinned to a single long-lived connection; each new
    /// connection to `:memory:` opens its own empty database.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);

        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            debug!(seed = %path.display(), "running seed file");
            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn credit_rate_to_columns(rate: &CreditRate) -> (&'static str, Option<String>) {
    match rate {
        CreditRate::Fixed(rate) => (CREDIT_KIND_FIXED, Some(decimal_to_text(*rate))),
        CreditRate::LowestBracket => (CREDIT_KIND_LOWEST_BRACKET, None),
    }
}

fn row_to_level_settings(row: &sqlx::sqlite::SqliteRow) -> Result<LevelSettings, RepositoryError> {
    let level_str: String = row.try_get("level").map_err(db_err)?;
    let level = TaxLevel::parse(&level_str)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid tax level: {}", level_str)))?;

    let kind: String = row.try_get("credit_rate_kind").map_err(db_err)?;
    let credit_rate = match kind.as_str() {
        CREDIT_KIND_FIXED => {
            let rate = get_optional_decimal(row, "credit_rate")?.ok_or_else(|| {
                RepositoryError::Database("Fixed credit rate is missing its rate".to_string())
            })?;
            CreditRate::Fixed(rate)
        }
        CREDIT_KIND_LOWEST_BRACKET => CreditRate::LowestBracket,
        other => {
            return Err(RepositoryError::Database(format!(
                "Invalid credit rate kind: {}",
                other
            )));
        }
    };

    Ok(LevelSettings {
        tax_year: row.try_get("tax_year").map_err(db_err)?,
        region: row.try_get("region").map_err(db_err)?,
        level,
        basic_personal_amount: get_decimal(row, "basic_personal_amount")?,
        credit_rate,
    })
}

fn row_to_tax_bracket(row: &sqlx::sqlite::SqliteRow) -> Result<TaxBracket, RepositoryError> {
    Ok(TaxBracket {
        min_income: get_decimal(row, "min_income")?,
        max_income: get_optional_decimal(row, "max_income")?,
        tax_rate: get_decimal(row, "tax_rate")?,
    })
}

fn row_to_member(row: &sqlx::sqlite::SqliteRow) -> Result<HouseholdMember, RepositoryError> {
    Ok(HouseholdMember {
        id: row.try_get("id").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        annual_salary: get_decimal(row, "annual_salary")?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get updated_at: {}", e)))?,
    })
}

#[async_trait]
impl RentRepository for SqliteRepository {
    async fn list_tax_years(&self) -> Result<Vec<i32>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT DISTINCT tax_year FROM level_settings ORDER BY tax_year DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| row.try_get("tax_year").map_err(db_err))
            .collect()
    }

    async fn list_regions(
        &self,
        tax_year: i32,
    ) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT region FROM level_settings
             WHERE tax_year = ? AND level = ?
             ORDER BY region",
        )
        .bind(tax_year)
        .bind(TaxLevel::Provincial.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| row.try_get("region").map_err(db_err))
            .collect()
    }

    async fn get_level_settings(
        &self,
        tax_year: i32,
        region: &str,
        level: TaxLevel,
    ) -> Result<LevelSettings, RepositoryError> {
        let row = sqlx::query(
            "SELECT tax_year, region, level, basic_personal_amount, credit_rate_kind, credit_rate
             FROM level_settings
             WHERE tax_year = ? AND region = ? AND level = ?",
        )
        .bind(tax_year)
        .bind(region)
        .bind(level.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_level_settings(&row)
    }

    async fn upsert_level_settings(
        &self,
        settings: &LevelSettings,
    ) -> Result<(), RepositoryError> {
        let (kind, rate) = credit_rate_to_columns(&settings.credit_rate);

        sqlx::query(
            "INSERT INTO level_settings (
                tax_year, region, level, basic_personal_amount, credit_rate_kind, credit_rate
             ) VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (tax_year, region, level) DO UPDATE SET
                basic_personal_amount = excluded.basic_personal_amount,
                credit_rate_kind = excluded.credit_rate_kind,
                credit_rate = excluded.credit_rate",
        )
        .bind(settings.tax_year)
        .bind(&settings.region)
        .bind(settings.level.as_str())
        .bind(decimal_to_text(settings.basic_personal_amount))
        .bind(kind)
        .bind(rate)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_tax_brackets(
        &self,
        tax_year: i32,
        region: &str,
        level: TaxLevel,
    ) -> Result<Vec<TaxBracket>, RepositoryError> {
        // Amounts are TEXT; sort numerically, not lexically.
        let rows = sqlx::query(
            "SELECT min_income, max_income, tax_rate
             FROM tax_brackets
             WHERE tax_year = ? AND region = ? AND level = ?
             ORDER BY CAST(min_income AS REAL)",
        )
        .bind(tax_year)
        .bind(region)
        .bind(level.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_tax_bracket).collect()
    }

    async fn insert_tax_bracket(
        &self,
        tax_year: i32,
        region: &str,
        level: TaxLevel,
        bracket: &TaxBracket,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO tax_brackets (tax_year, region, level, min_income, max_income, tax_rate)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(tax_year)
        .bind(region)
        .bind(level.as_str())
        .bind(decimal_to_text(bracket.min_income))
        .bind(bracket.max_income.map(decimal_to_text))
        .bind(decimal_to_text(bracket.tax_rate))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn delete_tax_brackets(
        &self,
        tax_year: i32,
        region: &str,
        level: TaxLevel,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM tax_brackets WHERE tax_year = ? AND region = ? AND level = ?")
            .bind(tax_year)
            .bind(region)
            .bind(level.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(())
    }

    async fn create_member(
        &self,
        member: NewHouseholdMember,
    ) -> Result<HouseholdMember, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO household_members (name, annual_salary, created_at, updated_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&member.name)
        .bind(decimal_to_text(member.annual_salary))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = result.last_insert_rowid();
        self.get_member(id).await
    }

    async fn get_member(
        &self,
        id: i64,
    ) -> Result<HouseholdMember, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, annual_salary, created_at, updated_at
             FROM household_members WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_member(&row)
    }

    async fn update_member(
        &self,
        member: &HouseholdMember,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE household_members SET name = ?, annual_salary = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&member.name)
        .bind(decimal_to_text(member.annual_salary))
        .bind(Utc::now())
        .bind(member.id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_member(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM household_members WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_members(&self) -> Result<Vec<HouseholdMember>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, annual_salary, created_at, updated_at
             FROM household_members ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(row_to_member).collect()
    }
}
