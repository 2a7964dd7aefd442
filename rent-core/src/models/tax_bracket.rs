use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One marginal-rate band of a progressive schedule.
///
/// The band covers the half-open interval `[min_income, max_income)`.
/// `max_income` is `None` only for the top band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub tax_rate: Decimal,
}

impl TaxBracket {
    pub fn new(
        min_income: Decimal,
        max_income: Option<Decimal>,
        tax_rate: Decimal,
    ) -> Self {
        Self {
            min_income,
            max_income,
            tax_rate,
        }
    }
}

/// Reasons a bracket table is rejected at load time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("tax schedule has no brackets")]
    Empty,

    #[error("first bracket must start at 0, starts at {0}")]
    DoesNotStartAtZero(Decimal),

    #[error("bracket {index} has rate {rate}, expected a value between 0 and 1")]
    InvalidRate { index: usize, rate: Decimal },

    #[error("bracket {index} is empty or inverted ({min} to {max})")]
    InvertedBounds {
        index: usize,
        min: Decimal,
        max: Decimal,
    },

    #[error("bracket {index} ends at {max} but bracket {next} starts at {next_min}")]
    NotContiguous {
        index: usize,
        max: Decimal,
        next: usize,
        next_min: Decimal,
    },

    #[error("bracket {0} is unbounded but is not the top bracket")]
    UnboundedBeforeTop(usize),

    #[error("top bracket must be unbounded, ends at {0}")]
    BoundedTop(Decimal),
}

/// A validated, read-only progressive bracket table.
///
/// Brackets are sorted ascending, chain without gaps or overlaps, start at
/// zero and end with an unbounded band. There is no way to mutate a schedule
/// once built; a new table means a new `TaxSchedule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TaxSchedule {
    brackets: Vec<TaxBracket>,
}

impl TaxSchedule {
    /// Validates `brackets` and wraps them.
    ///
    /// # Errors
    ///
    /// Returns the first [`ScheduleError`] found, scanning bottom-up.
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self, ScheduleError> {
        let first = brackets.first().ok_or(ScheduleError::Empty)?;
        if first.min_income != Decimal::ZERO {
            return Err(ScheduleError::DoesNotStartAtZero(first.min_income));
        }

        let last_index = brackets.len() - 1;
        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.tax_rate < Decimal::ZERO || bracket.tax_rate > Decimal::ONE {
                return Err(ScheduleError::InvalidRate {
                    index,
                    rate: bracket.tax_rate,
                });
            }

            match (bracket.max_income, index == last_index) {
                (None, true) => {}
                (None, false) => return Err(ScheduleError::UnboundedBeforeTop(index)),
                (Some(max), true) => return Err(ScheduleError::BoundedTop(max)),
                (Some(max), false) => {
                    if max <= bracket.min_income {
                        return Err(ScheduleError::InvertedBounds {
                            index,
                            min: bracket.min_income,
                            max,
                        });
                    }
                    let next_min = brackets[index + 1].min_income;
                    if next_min != max {
                        return Err(ScheduleError::NotContiguous {
                            index,
                            max,
                            next: index + 1,
                            next_min,
                        });
                    }
                }
            }
        }

        Ok(Self { brackets })
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Rate of the lowest band.
    pub fn lowest_rate(&self) -> Decimal {
        // Non-empty by construction.
        self.brackets[0].tax_rate
    }

    /// Lower bounds of every band above the first, in ascending order.
    pub fn thresholds(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.brackets.iter().skip(1).map(|b| b.min_income)
    }
}

impl TryFrom<Vec<TaxBracket>> for TaxSchedule {
    type Error = ScheduleError;

    fn try_from(brackets: Vec<TaxBracket>) -> Result<Self, Self::Error> {
        Self::new(brackets)
    }
}

impl<'de> Deserialize<'de> for TaxSchedule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let brackets = Vec::<TaxBracket>::deserialize(deserializer)?;
        TaxSchedule::new(brackets).map_err(serde::de::Error::custom)
    }
}
