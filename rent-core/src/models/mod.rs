mod household_member;
mod jurisdiction;
mod preferences;
mod take_home;
mod tax_bracket;

pub use household_member::{HouseholdMember, NewHouseholdMember};
pub use jurisdiction::{CreditRate, FEDERAL_REGION, JurisdictionTaxConfig, LevelTaxConfig, TaxLevel};
pub use preferences::Preferences;
pub use take_home::TakeHomeResult;
pub use tax_bracket::{ScheduleError, TaxBracket, TaxSchedule};
