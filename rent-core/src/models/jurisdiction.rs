use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tax_bracket::{TaxBracket, TaxSchedule};

/// Region code under which the federal schedule is stored.
pub const FEDERAL_REGION: &str = "CA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxLevel {
    Federal,
    Provincial,
}

impl TaxLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Federal => "federal",
            Self::Provincial => "provincial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "federal" => Some(Self::Federal),
            "provincial" => Some(Self::Provincial),
            _ => None,
        }
    }
}

impl fmt::Display for TaxLevel {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the basic-personal-amount credit rate is chosen for a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rate", rename_all = "snake_case")]
pub enum CreditRate {
    /// A jurisdiction constant, independent of the schedule.
    Fixed(Decimal),
    /// The rate of the schedule's first bracket.
    LowestBracket,
}

impl CreditRate {
    pub fn resolve(
        &self,
        schedule: &TaxSchedule,
    ) -> Decimal {
        match self {
            Self::Fixed(rate) => *rate,
            Self::LowestBracket => schedule.lowest_rate(),
        }
    }
}

/// Everything needed to compute one level's net tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTaxConfig {
    pub schedule: TaxSchedule,
    pub basic_personal_amount: Decimal,
    pub credit_rate: CreditRate,
}

/// Both tax levels for one region and tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionTaxConfig {
    pub tax_year: i32,
    pub region: String,
    pub federal: LevelTaxConfig,
    pub provincial: LevelTaxConfig,
}

impl JurisdictionTaxConfig {
    pub fn level(
        &self,
        level: TaxLevel,
    ) -> &LevelTaxConfig {
        match level {
            TaxLevel::Federal => &self.federal,
            TaxLevel::Provincial => &self.provincial,
        }
    }

    /// Built-in 2025 federal schedule with the British Columbia provincial
    /// schedule.
    pub fn reference() -> Self {
        Self {
            tax_year: 2025,
            region: "BC".to_string(),
            federal: LevelTaxConfig {
                schedule: reference_schedule(&[
                    (0, Some(57_375), Decimal::new(15, 2)),
                    (57_375, Some(114_750), Decimal::new(205, 3)),
                    (114_750, Some(177_882), Decimal::new(26, 2)),
                    (177_882, Some(253_414), Decimal::new(29, 2)),
                    (253_414, None, Decimal::new(33, 2)),
                ]),
                basic_personal_amount: Decimal::from(16_129),
                credit_rate: CreditRate::Fixed(Decimal::new(15, 2)),
            },
            provincial: LevelTaxConfig {
                schedule: reference_schedule(&[
                    (0, Some(47_937), Decimal::new(506, 4)),
                    (47_937, Some(95_875), Decimal::new(77, 3)),
                    (95_875, Some(110_076), Decimal::new(105, 3)),
                    (110_076, Some(133_664), Decimal::new(1229, 4)),
                    (133_664, Some(181_232), Decimal::new(147, 3)),
                    (181_232, Some(252_752), Decimal::new(168, 3)),
                    (252_752, None, Decimal::new(205, 3)),
                ]),
                basic_personal_amount: Decimal::from(12_580),
                credit_rate: CreditRate::LowestBracket,
            },
        }
    }
}

fn reference_schedule(bands: &[(i64, Option<i64>, Decimal)]) -> TaxSchedule {
    let brackets = bands
        .iter()
        .map(|&(min, max, rate)| {
            TaxBracket::new(Decimal::from(min), max.map(Decimal::from), rate)
        })
        .collect();
    TaxSchedule::new(brackets).expect("built-in reference schedule is contiguous")
}
