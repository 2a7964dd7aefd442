use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{
    CreditRate, FEDERAL_REGION, HouseholdMember, JurisdictionTaxConfig, LevelTaxConfig,
    NewHouseholdMember, TaxBracket, TaxLevel, TaxSchedule,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Per-level settings stored alongside a bracket table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSettings {
    pub tax_year: i32,
    pub region: String,
    pub level: TaxLevel,
    pub basic_personal_amount: Decimal,
    pub credit_rate: CreditRate,
}

#[async_trait]
pub trait RentRepository: Send + Sync {
    // Tax configuration
    async fn list_tax_years(&self) -> Result<Vec<i32>, RepositoryError>;
    async fn list_regions(
        &self,
        tax_year: i32,
    ) -> Result<Vec<String>, RepositoryError>;

    async fn get_level_settings(
        &self,
        tax_year: i32,
        region: &str,
        level: TaxLevel,
    ) -> Result<LevelSettings, RepositoryError>;

    async fn upsert_level_settings(
        &self,
        settings: &LevelSettings,
    ) -> Result<(), RepositoryError>;

    // Tax brackets
    async fn get_tax_brackets(
        &self,
        tax_year: i32,
        region: &str,
        level: TaxLevel,
    ) -> Result<Vec<TaxBracket>, RepositoryError>;

    async fn insert_tax_bracket(
        &self,
        tax_year: i32,
        region: &str,
        level: TaxLevel,
        bracket: &TaxBracket,
    ) -> Result<(), RepositoryError>;

    async fn delete_tax_brackets(
        &self,
        tax_year: i32,
        region: &str,
        level: TaxLevel,
    ) -> Result<(), RepositoryError>;

    // Household members
    async fn create_member(
        &self,
        member: NewHouseholdMember,
    ) -> Result<HouseholdMember, RepositoryError>;

    async fn get_member(
        &self,
        id: i64,
    ) -> Result<HouseholdMember, RepositoryError>;

    async fn update_member(
        &self,
        member: &HouseholdMember,
    ) -> Result<(), RepositoryError>;

    async fn delete_member(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError>;

    async fn list_members(&self) -> Result<Vec<HouseholdMember>, RepositoryError>;

    /// Assembles and validates the configuration for `region` in `tax_year`.
    ///
    /// The federal level is read from [`FEDERAL_REGION`]. A table that fails
    /// [`TaxSchedule`] validation is reported as
    /// [`RepositoryError::Configuration`].
    async fn load_jurisdiction_config(
        &self,
        tax_year: i32,
        region: &str,
    ) -> Result<JurisdictionTaxConfig, RepositoryError> {
        let federal = load_level(self, tax_year, FEDERAL_REGION, TaxLevel::Federal).await?;
        let provincial = load_level(self, tax_year, region, TaxLevel::Provincial).await?;

        Ok(JurisdictionTaxConfig {
            tax_year,
            region: region.to_string(),
            federal,
            provincial,
        })
    }
}

async fn load_level<R: RentRepository + ?Sized>(
    repo: &R,
    tax_year: i32,
    region: &str,
    level: TaxLevel,
) -> Result<LevelTaxConfig, RepositoryError> {
    let settings = repo.get_level_settings(tax_year, region, level).await?;
    let brackets = repo.get_tax_brackets(tax_year, region, level).await?;
    let schedule = TaxSchedule::new(brackets).map_err(|e| {
        RepositoryError::Configuration(format!(
            "{} schedule for {region} {tax_year}: {e}",
            level.as_str()
        ))
    })?;

    Ok(LevelTaxConfig {
        schedule,
        basic_personal_amount: settings.basic_personal_amount,
        credit_rate: settings.credit_rate,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    type TableKey = (i32, String, TaxLevel);

    /// Read-only fake: serves settings and brackets from maps; the table
    /// writes are unimplemented.
    #[derive(Default)]
    struct MapRepository {
        settings: HashMap<TableKey, LevelSettings>,
        brackets: HashMap<TableKey, Vec<TaxBracket>>,
    }

    impl MapRepository {
        fn with_level(
            mut self,
            region: &str,
            level: TaxLevel,
            config: &LevelTaxConfig,
        ) -> Self {
            let key = (2025, region.to_string(), level);
            self.settings.insert(
                key.clone(),
                LevelSettings {
                    tax_year: 2025,
                    region: region.to_string(),
                    level,
                    basic_personal_amount: config.basic_personal_amount,
                    credit_rate: config.credit_rate,
                },
            );
            self.brackets.insert(key, config.schedule.brackets().to_vec());
            self
        }

        fn reference() -> Self {
            let reference = JurisdictionTaxConfig::reference();
            Self::default()
                .with_level(FEDERAL_REGION, TaxLevel::Federal, &reference.federal)
                .with_level("BC", TaxLevel::Provincial, &reference.provincial)
        }
    }

    #[async_trait]
    impl RentRepository for MapRepository {
        async fn list_tax_years(&self) -> Result<Vec<i32>, RepositoryError> {
            Ok(vec![2025])
        }
        async fn list_regions(&self, _tax_year: i32) -> Result<Vec<String>, RepositoryError> {
            Ok(vec!["BC".to_string()])
        }
        async fn get_level_settings(
            &self,
            tax_year: i32,
            region: &str,
            level: TaxLevel,
        ) -> Result<LevelSettings, RepositoryError> {
            self.settings
                .get(&(tax_year, region.to_string(), level))
                .cloned()
                .ok_or(RepositoryError::NotFound)
        }
        async fn upsert_level_settings(
            &self,
            _settings: &LevelSettings,
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn get_tax_brackets(
            &self,
            tax_year: i32,
            region: &str,
            level: TaxLevel,
        ) -> Result<Vec<TaxBracket>, RepositoryError> {
            Ok(self
                .brackets
                .get(&(tax_year, region.to_string(), level))
                .cloned()
                .unwrap_or_default())
        }
        async fn insert_tax_bracket(
            &self,
            _tax_year: i32,
            _region: &str,
            _level: TaxLevel,
            _bracket: &TaxBracket,
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn delete_tax_brackets(
            &self,
            _tax_year: i32,
            _region: &str,
            _level: TaxLevel,
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn create_member(
            &self,
            member: NewHouseholdMember,
        ) -> Result<HouseholdMember, RepositoryError> {
            Ok(HouseholdMember {
                id: 1,
                name: member.name,
                annual_salary: member.annual_salary,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
        }
        async fn get_member(&self, _id: i64) -> Result<HouseholdMember, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn update_member(&self, _member: &HouseholdMember) -> Result<(), RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn delete_member(&self, _id: i64) -> Result<(), RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn list_members(&self) -> Result<Vec<HouseholdMember>, RepositoryError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn load_jurisdiction_config_assembles_both_levels() {
        let repo = MapRepository::reference();

        let config = repo
            .load_jurisdiction_config(2025, "BC")
            .await
            .expect("reference tables should load");

        assert_eq!(config, JurisdictionTaxConfig::reference());
    }

    #[tokio::test]
    async fn load_jurisdiction_config_missing_region_is_not_found() {
        let repo = MapRepository::reference();

        let result = repo.load_jurisdiction_config(2025, "ON").await;

        assert_eq!(result, Err(RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn load_jurisdiction_config_rejects_broken_schedule() {
        let mut repo = MapRepository::reference();
        let key = (2025, "BC".to_string(), TaxLevel::Provincial);
        repo.brackets.get_mut(&key).unwrap()[1].min_income = dec!(50000);

        let result = repo.load_jurisdiction_config(2025, "BC").await;

        match result {
            Err(RepositoryError::Configuration(msg)) => {
                assert!(msg.contains("provincial"), "message was: {msg}");
                assert!(msg.contains("BC"), "message was: {msg}");
            }
            other => panic!("expected Configuration error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn load_jurisdiction_config_rejects_empty_schedule() {
        let mut repo = MapRepository::reference();
        repo.brackets
            .insert((2025, FEDERAL_REGION.to_string(), TaxLevel::Federal), vec![]);

        let result = repo.load_jurisdiction_config(2025, "BC").await;

        assert!(matches!(result, Err(RepositoryError::Configuration(_))));
    }
}
