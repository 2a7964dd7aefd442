use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What a user is looking for in a rental.
///
/// Field order is part of the cache key (see [`crate::cache::preferences_hash`]),
/// so new fields go at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub max_rent: Option<Decimal>,
    pub min_bedrooms: Option<u8>,
    pub neighbourhoods: Vec<String>,
    pub must_haves: Vec<String>,
}
