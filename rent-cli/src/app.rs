//! Command logic for `rent-budget`, kept apart from argument parsing so it
//! can be driven directly from tests.

use std::fmt;

use rust_decimal::Decimal;
use tracing::{info, warn};

use rent_core::calculations::{
    AFFORDABLE_RENT_PERCENTAGE, AffordabilityRow, HouseholdAffordability, TakeHomeCalculator,
    affordability_table, compute_affordable_rent, household_affordability, rent_share,
};
use rent_core::db::{DbConfig, RepositoryRegistry};
use rent_core::{
    HouseholdMember, JurisdictionTaxConfig, RentRepository, RepositoryError, SharedTaxConfig,
    TakeHomeResult,
};
use rent_db_sqlite::SqliteRepositoryFactory;

use crate::config::Settings;
use crate::utils::format_currency;

/// Registry with every backend this binary ships with.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

pub fn db_config(settings: &Settings) -> DbConfig {
    DbConfig {
        backend: settings.backend.clone(),
        connection_string: settings.database.clone(),
    }
}

/// Installs the stored configuration for (`tax_year`, `region`) into `shared`.
///
/// When the database has no tables for that pair the built-in reference
/// configuration already held by `shared` stays active and a warning is
/// logged. Any other repository error, including a stored table that fails
/// validation, is returned.
pub async fn activate_tax_config(
    repo: &dyn RentRepository,
    shared: &SharedTaxConfig,
    tax_year: i32,
    region: &str,
) -> Result<(), RepositoryError> {
    match repo.load_jurisdiction_config(tax_year, region).await {
        Ok(config) => {
            shared.replace(config);
            Ok(())
        }
        Err(RepositoryError::NotFound) => {
            let active = shared.current();
            warn!(
                tax_year,
                region,
                fallback_year = active.tax_year,
                fallback_region = %active.region,
                "no stored tax tables, using built-in reference configuration"
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}

// ─── take-home ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeHomeReport {
    pub tax_year: i32,
    pub region: String,
    pub salary: Decimal,
    pub result: TakeHomeResult,
    pub affordable_rent: Decimal,
}

pub fn take_home_report(
    config: &JurisdictionTaxConfig,
    salary: Decimal,
) -> TakeHomeReport {
    let result = TakeHomeCalculator::new(config).calculate(salary);
    TakeHomeReport {
        tax_year: config.tax_year,
        region: config.region.clone(),
        salary,
        affordable_rent: compute_affordable_rent(result.monthly_take_home),
        result,
    }
}

impl fmt::Display for TakeHomeReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let r = &self.result;
        writeln!(f, "Take-home pay ({} {})", self.region, self.tax_year)?;
        writeln!(f, "  Gross salary        {:>12}", format_currency(self.salary))?;
        writeln!(f, "  Federal tax         {:>12}", format_currency(r.federal_tax))?;
        writeln!(f, "  Provincial tax      {:>12}", format_currency(r.provincial_tax))?;
        writeln!(f, "  Total tax           {:>12}", format_currency(r.total_tax))?;
        writeln!(f, "  Annual take-home    {:>12}", format_currency(r.annual_take_home))?;
        writeln!(f, "  Monthly take-home   {:>12}", format_currency(r.monthly_take_home))?;
        write!(
            f,
            "  Affordable rent ({}%) {:>11}",
            AFFORDABLE_RENT_PERCENTAGE,
            format_currency(self.affordable_rent)
        )
    }
}

// ─── afford ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffordReport {
    pub combined_monthly: Decimal,
    pub affordable_rent: Decimal,
    pub table: Vec<AffordabilityRow>,
}

/// Affordability for monthly incomes that are already net of tax.
pub fn afford_report(monthly_incomes: &[Decimal]) -> AffordReport {
    let combined: Decimal = monthly_incomes.iter().copied().sum();
    AffordReport {
        combined_monthly: combined,
        affordable_rent: compute_affordable_rent(combined),
        table: affordability_table(combined),
    }
}

fn write_table(
    f: &mut fmt::Formatter<'_>,
    table: &[AffordabilityRow],
) -> fmt::Result {
    writeln!(f, "  Guideline")?;
    for row in table {
        let marker = if row.percentage == AFFORDABLE_RENT_PERCENTAGE {
            "  <- recommended"
        } else {
            ""
        };
        writeln!(
            f,
            "    {:>3}%  {:>10}{}",
            row.percentage,
            format_currency(row.rent),
            marker
        )?;
    }
    Ok(())
}

impl fmt::Display for AffordReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(
            f,
            "Combined monthly take-home  {}",
            format_currency(self.combined_monthly)
        )?;
        writeln!(
            f,
            "Affordable rent ({}%)       {}",
            AFFORDABLE_RENT_PERCENTAGE,
            format_currency(self.affordable_rent)
        )?;
        write_table(f, &self.table)
    }
}

// ─── household ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberLine {
    pub id: i64,
    pub name: String,
    pub annual_salary: Decimal,
    pub monthly_take_home: Decimal,
    pub rent_share: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseholdReport {
    pub tax_year: i32,
    pub region: String,
    pub members: Vec<MemberLine>,
    pub household: HouseholdAffordability,
}

/// Take-home for every member, combined affordability, and each member's
/// share of the recommended rent in proportion to their monthly take-home.
pub fn household_report(
    config: &JurisdictionTaxConfig,
    members: &[HouseholdMember],
) -> HouseholdReport {
    let calculator = TakeHomeCalculator::new(config);
    let results: Vec<TakeHomeResult> = members
        .iter()
        .map(|m| calculator.calculate(m.annual_salary))
        .collect();
    let household = household_affordability(&results);

    let lines = members
        .iter()
        .zip(&results)
        .map(|(member, result)| MemberLine {
            id: member.id,
            name: member.name.clone(),
            annual_salary: member.annual_salary,
            monthly_take_home: result.monthly_take_home,
            rent_share: rent_share(
                household.affordable_rent,
                household.combined_monthly_take_home,
                result.monthly_take_home,
            ),
        })
        .collect();

    info!(members = members.len(), "household affordability computed");
    HouseholdReport {
        tax_year: config.tax_year,
        region: config.region.clone(),
        members: lines,
        household,
    }
}

impl fmt::Display for HouseholdReport {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.members.is_empty() {
            return write!(f, "No household members. Add one with `rent-budget member add`.");
        }

        writeln!(f, "Household ({} {})", self.region, self.tax_year)?;
        writeln!(
            f,
            "  {:<4} {:<20} {:>12} {:>10} {:>10}",
            "ID", "Name", "Salary", "Monthly", "Rent share"
        )?;
        for line in &self.members {
            writeln!(
                f,
                "  {:<4} {:<20} {:>12} {:>10} {:>10}",
                line.id,
                line.name,
                format_currency(line.annual_salary),
                format_currency(line.monthly_take_home),
                format_currency(line.rent_share)
            )?;
        }
        writeln!(
            f,
            "Combined monthly take-home  {}",
            format_currency(self.household.combined_monthly_take_home)
        )?;
        writeln!(
            f,
            "Affordable rent ({}%)       {}",
            AFFORDABLE_RENT_PERCENTAGE,
            format_currency(self.household.affordable_rent)
        )?;
        write_table(f, &self.household.table)
    }
}

/// One line per stored member, for `member list`.
pub fn format_member_list(members: &[HouseholdMember]) -> String {
    if members.is_empty() {
        return "No household members.".to_string();
    }
    members
        .iter()
        .map(|m| format!("{:>4}  {:<20} {:>12}", m.id, m.name, format_currency(m.annual_salary)))
        .collect::<Vec<_>>()
        .join("\n")
}
