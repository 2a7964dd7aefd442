//! Rent affordability guidelines.
//!
//! The recommended ceiling is 33% of combined monthly take-home. The other
//! guideline percentages are the same computation with a different
//! multiplier and exist only for side-by-side comparison.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::TakeHomeResult;
use crate::calculations::common::round_to_whole;

/// Share of combined monthly take-home recommended as the rent ceiling.
pub const AFFORDABLE_RENT_RATIO: Decimal = Decimal::from_parts(33, 0, 0, false, 2);

/// [`AFFORDABLE_RENT_RATIO`] as a whole percentage, for the guideline table.
pub const AFFORDABLE_RENT_PERCENTAGE: u32 = 33;

/// Percentages shown in the comparison table, ascending.
pub const GUIDELINE_PERCENTAGES: [u32; 5] = [25, 30, AFFORDABLE_RENT_PERCENTAGE, 35, 40];

/// `round(monthly_income × percentage / 100)`.
pub fn rent_at_percentage(
    monthly_income: Decimal,
    percentage: u32,
) -> Decimal {
    round_to_whole(monthly_income * Decimal::from(percentage) / Decimal::ONE_HUNDRED)
}

/// Recommended maximum monthly rent for a combined monthly take-home.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use rent_core::calculations::compute_affordable_rent;
///
/// assert_eq!(compute_affordable_rent(dec!(6000)), dec!(1980));
/// ```
pub fn compute_affordable_rent(monthly_take_home_combined: Decimal) -> Decimal {
    round_to_whole(monthly_take_home_combined * AFFORDABLE_RENT_RATIO)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffordabilityRow {
    pub percentage: u32,
    pub rent: Decimal,
}

/// One row per entry in [`GUIDELINE_PERCENTAGES`].
pub fn affordability_table(monthly_income: Decimal) -> Vec<AffordabilityRow> {
    GUIDELINE_PERCENTAGES
        .iter()
        .map(|&percentage| AffordabilityRow {
            percentage,
            rent: rent_at_percentage(monthly_income, percentage),
        })
        .collect()
}

/// Affordability for everyone sharing a rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdAffordability {
    pub members: usize,
    pub combined_monthly_take_home: Decimal,
    pub affordable_rent: Decimal,
    pub table: Vec<AffordabilityRow>,
}

/// Sums each member's rounded monthly take-home and applies the guidelines.
pub fn household_affordability(results: &[TakeHomeResult]) -> HouseholdAffordability {
    let combined: Decimal = results.iter().map(|r| r.monthly_take_home).sum();

    HouseholdAffordability {
        members: results.len(),
        combined_monthly_take_home: combined,
        affordable_rent: compute_affordable_rent(combined),
        table: affordability_table(combined),
    }
}

/// A member's income-proportional share of `rent`, rounded.
///
/// Zero when the household has no combined income.
pub fn rent_share(
    rent: Decimal,
    combined_monthly: Decimal,
    member_monthly: Decimal,
) -> Decimal {
    if combined_monthly <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round_to_whole(rent * member_monthly / combined_monthly)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn result_with_monthly(monthly: Decimal) -> TakeHomeResult {
        TakeHomeResult {
            federal_tax: dec!(0),
            provincial_tax: dec!(0),
            total_tax: dec!(0),
            annual_take_home: monthly * dec!(12),
            monthly_take_home: monthly,
        }
    }

    #[test]
    fn affordable_rent_is_thirty_three_percent() {
        assert_eq!(compute_affordable_rent(dec!(6000)), dec!(1980));
    }

    #[test]
    fn ratio_and_percentage_agree() {
        assert_eq!(AFFORDABLE_RENT_RATIO, dec!(0.33));
        assert_eq!(
            AFFORDABLE_RENT_RATIO * Decimal::ONE_HUNDRED,
            Decimal::from(AFFORDABLE_RENT_PERCENTAGE)
        );
        assert_eq!(
            compute_affordable_rent(dec!(5944)),
            rent_at_percentage(dec!(5944), AFFORDABLE_RENT_PERCENTAGE)
        );
    }

    #[test]
    fn affordable_rent_of_zero_is_zero() {
        assert_eq!(compute_affordable_rent(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn affordable_rent_rounds_to_whole() {
        // 5111 × 0.33 = 1686.63
        assert_eq!(compute_affordable_rent(dec!(5111)), dec!(1687));
        // 1234 × 0.33 = 407.22
        assert_eq!(compute_affordable_rent(dec!(1234)), dec!(407));
    }

    #[test]
    fn affordable_rent_is_linear() {
        let mut income = Decimal::ZERO;
        while income <= dec!(20000) {
            assert_eq!(
                compute_affordable_rent(income),
                round_to_whole(income * AFFORDABLE_RENT_RATIO)
            );
            income += dec!(173.37);
        }
    }

    #[test]
    fn table_covers_every_guideline() {
        let table = affordability_table(dec!(6000));

        assert_eq!(
            table,
            vec![
                AffordabilityRow { percentage: 25, rent: dec!(1500) },
                AffordabilityRow { percentage: 30, rent: dec!(1800) },
                AffordabilityRow { percentage: 33, rent: dec!(1980) },
                AffordabilityRow { percentage: 35, rent: dec!(2100) },
                AffordabilityRow { percentage: 40, rent: dec!(2400) },
            ]
        );
    }

    #[test]
    fn household_sums_members_before_applying_ratio() {
        let results = [result_with_monthly(dec!(3000)), result_with_monthly(dec!(2500))];

        let household = household_affordability(&results);

        assert_eq!(household.members, 2);
        assert_eq!(household.combined_monthly_take_home, dec!(5500));
        assert_eq!(household.affordable_rent, dec!(1815));
        assert_eq!(household.table.len(), GUIDELINE_PERCENTAGES.len());
    }

    #[test]
    fn empty_household_can_afford_nothing() {
        let household = household_affordability(&[]);

        assert_eq!(household.members, 0);
        assert_eq!(household.affordable_rent, Decimal::ZERO);
        assert!(household.table.iter().all(|row| row.rent == Decimal::ZERO));
    }

    #[test]
    fn rent_share_is_proportional_to_income() {
        assert_eq!(rent_share(dec!(1815), dec!(5500), dec!(3000)), dec!(990));
        assert_eq!(rent_share(dec!(1815), dec!(5500), dec!(2500)), dec!(825));
    }

    #[test]
    fn rent_share_without_income_is_zero() {
        assert_eq!(rent_share(dec!(1500), Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
    }
}
