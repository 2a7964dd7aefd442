//! Take-home pay and rent affordability calculators.
//!
//! Everything here is a pure function of its inputs and an immutable
//! [`crate::JurisdictionTaxConfig`]; nothing performs I/O or keeps state
//! between calls.

pub mod affordability;
pub mod bracket;
pub mod common;
pub mod take_home;

pub use affordability::{
    AFFORDABLE_RENT_PERCENTAGE, AFFORDABLE_RENT_RATIO, AffordabilityRow, GUIDELINE_PERCENTAGES,
    HouseholdAffordability, affordability_table, compute_affordable_rent, household_affordability,
    rent_at_percentage, rent_share,
};
pub use bracket::compute_bracket_tax;
pub use take_home::{TakeHomeCalculator, compute_take_home, net_level_tax};
