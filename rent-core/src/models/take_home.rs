use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-person tax and take-home breakdown.
///
/// Every field is rounded to a whole unit on its own, so `total_tax` may
/// differ from `federal_tax + provincial_tax` by one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeHomeResult {
    pub federal_tax: Decimal,
    pub provincial_tax: Decimal,
    pub total_tax: Decimal,
    pub annual_take_home: Decimal,
    pub monthly_take_home: Decimal,
}
