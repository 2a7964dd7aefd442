//! Progressive (marginal-rate) bracket tax.
//!
//! Income inside each band is taxed only at that band's rate:
//!
//! ```text
//! tax = Σ (min(income, band.max) - band.min) × band.rate   for every band with income > band.min
//! ```
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use rent_core::calculations::compute_bracket_tax;
//! use rent_core::TaxBracket;
//!
//! let brackets = vec![
//!     TaxBracket::new(dec!(0), Some(dec!(57375)), dec!(0.15)),
//!     TaxBracket::new(dec!(57375), None, dec!(0.205)),
//! ];
//!
//! assert_eq!(compute_bracket_tax(dec!(75000), &brackets), dec!(12219.375));
//! ```

use rust_decimal::Decimal;

use crate::TaxBracket;
use crate::calculations::common::max;

/// Gross tax owed on `income` under `brackets`.
///
/// `brackets` must be ascending and contiguous from zero (a
/// [`crate::TaxSchedule`] guarantees this). The result is unrounded and
/// never negative; zero or negative income yields zero.
pub fn compute_bracket_tax(
    income: Decimal,
    brackets: &[TaxBracket],
) -> Decimal {
    let mut tax = Decimal::ZERO;

    for bracket in brackets {
        if income <= bracket.min_income {
            break;
        }
        let upper = match bracket.max_income {
            Some(max_income) => income.min(max_income),
            None => income,
        };
        tax += (upper - bracket.min_income) * bracket.tax_rate;
    }

    max(tax, Decimal::ZERO)
}
