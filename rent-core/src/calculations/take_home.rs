//! Net tax and take-home pay for one person.
//!
//! # Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Gross federal tax from the federal schedule |
//! | 2    | Federal credit: basic personal amount × federal credit rate |
//! | 3    | Net federal tax: Step 1 - Step 2 (minimum 0) |
//! | 4    | Gross provincial tax from the provincial schedule |
//! | 5    | Provincial credit: basic personal amount × provincial credit rate |
//! | 6    | Net provincial tax: Step 4 - Step 5 (minimum 0) |
//! | 7    | Total tax: Step 3 + Step 6 |
//! | 8    | Annual take-home: salary - Step 7 |
//! | 9    | Monthly take-home: Step 8 ÷ 12 |
//!
//! Steps 3, 6, 7, 8 and 9 are each rounded to a whole unit independently,
//! from their unrounded inputs.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use rent_core::JurisdictionTaxConfig;
//! use rent_core::calculations::TakeHomeCalculator;
//!
//! let config = JurisdictionTaxConfig::reference();
//! let result = TakeHomeCalculator::new(&config).calculate(dec!(75000));
//!
//! assert_eq!(result.federal_tax, dec!(9800));
//! assert_eq!(result.provincial_tax, dec!(3873));
//! assert_eq!(result.monthly_take_home, dec!(5111));
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::bracket::compute_bracket_tax;
use crate::calculations::common::{max, round_to_whole};
use crate::{JurisdictionTaxConfig, LevelTaxConfig, TakeHomeResult};

const MONTHS_PER_YEAR: u32 = 12;

/// Net tax for one level after the basic-personal-amount credit.
///
/// The result is unrounded and never negative, however large the credit.
pub fn net_level_tax(
    annual_salary: Decimal,
    level: &LevelTaxConfig,
) -> Decimal {
    let gross = compute_bracket_tax(annual_salary, level.schedule.brackets());
    let credit = level.basic_personal_amount * level.credit_rate.resolve(&level.schedule);
    max(gross - credit, Decimal::ZERO)
}

/// Take-home calculator bound to one jurisdiction's configuration.
#[derive(Debug, Clone, Copy)]
pub struct TakeHomeCalculator<'a> {
    config: &'a JurisdictionTaxConfig,
}

impl<'a> TakeHomeCalculator<'a> {
    pub fn new(config: &'a JurisdictionTaxConfig) -> Self {
        Self { config }
    }

    /// Computes the full breakdown for `annual_salary`.
    ///
    /// Zero or negative salaries owe no tax and keep the whole salary.
    pub fn calculate(
        &self,
        annual_salary: Decimal,
    ) -> TakeHomeResult {
        let federal_tax = net_level_tax(annual_salary, &self.config.federal);
        let provincial_tax = net_level_tax(annual_salary, &self.config.provincial);
        let total_tax = federal_tax + provincial_tax;
        let annual_take_home = annual_salary - total_tax;
        let monthly_take_home = annual_take_home / Decimal::from(MONTHS_PER_YEAR);

        debug!(
            tax_year = self.config.tax_year,
            region = %self.config.region,
            %annual_salary,
            %federal_tax,
            %provincial_tax,
            "computed take-home"
        );

        TakeHomeResult {
            federal_tax: round_to_whole(federal_tax),
            provincial_tax: round_to_whole(provincial_tax),
            total_tax: round_to_whole(total_tax),
            annual_take_home: round_to_whole(annual_take_home),
            monthly_take_home: round_to_whole(monthly_take_home),
        }
    }
}

/// Convenience wrapper around [`TakeHomeCalculator::calculate`].
pub fn compute_take_home(
    annual_salary: Decimal,
    config: &JurisdictionTaxConfig,
) -> TakeHomeResult {
    TakeHomeCalculator::new(config).calculate(annual_salary)
}
