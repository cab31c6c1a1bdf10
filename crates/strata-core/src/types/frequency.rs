//! Payment frequency for swap legs and premium schedules.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Tenor;

/// Payment frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Frequency {
    /// One payment per year
    Annual,
    /// Two payments per year
    #[default]
    SemiAnnual,
    /// Four payments per year
    Quarterly,
    /// Twelve payments per year
    Monthly,
}

impl Frequency {
    /// Number of periods per year.
    #[must_use]
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::Annual => 1,
            Frequency::SemiAnnual => 2,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
        }
    }

    /// Number of months per period.
    #[must_use]
    pub fn months_per_period(&self) -> u32 {
        12 / self.periods_per_year()
    }

    /// The accrual period as a tenor.
    #[must_use]
    pub fn tenor(&self) -> Tenor {
        Tenor::months(self.months_per_period() as i32)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Annual => "Annual",
            Frequency::SemiAnnual => "Semi-Annual",
            Frequency::Quarterly => "Quarterly",
            Frequency::Monthly => "Monthly",
        };
        write!(f, "{name}")
    }
}
