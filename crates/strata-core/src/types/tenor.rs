//! Market tenors such as `ON`, `1W`, `3M` and `10Y`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Date;
use crate::error::{CoreError, CoreResult};

/// Unit of a tenor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenorUnit {
    /// Calendar days
    Day,
    /// Weeks
    Week,
    /// Months
    Month,
    /// Years
    Year,
}

/// A period length quoted in market terms.
///
/// # Example
///
/// ```rust
/// use strata_core::types::{Date, Tenor};
///
/// let tenor: Tenor = "6M".parse().unwrap();
/// let start = Date::from_ymd(2025, 8, 31).unwrap();
/// assert_eq!(tenor.add_to(start).unwrap(), Date::from_ymd(2026, 2, 28).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tenor {
    /// Number of units.
    pub amount: i32,
    /// The unit.
    pub unit: TenorUnit,
}

impl Tenor {
    /// Creates a tenor.
    #[must_use]
    pub const fn new(amount: i32, unit: TenorUnit) -> Self {
        Self { amount, unit }
    }

    /// A tenor of `n` days.
    #[must_use]
    pub const fn days(n: i32) -> Self {
        Self::new(n, TenorUnit::Day)
    }

    /// A tenor of `n` weeks.
    #[must_use]
    pub const fn weeks(n: i32) -> Self {
        Self::new(n, TenorUnit::Week)
    }

    /// A tenor of `n` months.
    #[must_use]
    pub const fn months(n: i32) -> Self {
        Self::new(n, TenorUnit::Month)
    }

    /// A tenor of `n` years.
    #[must_use]
    pub const fn years(n: i32) -> Self {
        Self::new(n, TenorUnit::Year)
    }

    /// Shifts `date` by this tenor without business-day adjustment.
    pub fn add_to(&self, date: Date) -> CoreResult<Date> {
        match self.unit {
            TenorUnit::Day => Ok(date.add_days(i64::from(self.amount))),
            TenorUnit::Week => Ok(date.add_days(7 * i64::from(self.amount))),
            TenorUnit::Month => date.add_months(self.amount),
            TenorUnit::Year => date.add_years(self.amount),
        }
    }

    /// Multiplies the tenor by an integer factor.
    #[must_use]
    pub fn times(&self, factor: i32) -> Self {
        Self::new(self.amount * factor, self.unit)
    }

    /// Approximate length in years.
    #[must_use]
    pub fn year_fraction_estimate(&self) -> f64 {
        let n = f64::from(self.amount);
        match self.unit {
            TenorUnit::Day => n / 365.0,
            TenorUnit::Week => 7.0 * n / 365.0,
            TenorUnit::Month => n / 12.0,
            TenorUnit::Year => n,
        }
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            TenorUnit::Day => 'D',
            TenorUnit::Week => 'W',
            TenorUnit::Month => 'M',
            TenorUnit::Year => 'Y',
        };
        write!(f, "{}{unit}", self.amount)
    }
}

impl FromStr for Tenor {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim().to_ascii_uppercase();
        match t.as_str() {
            "ON" => return Ok(Tenor::days(1)),
            "TN" => return Ok(Tenor::days(2)),
            _ => {}
        }

        let Some(unit_char) = t.chars().last() else {
            return Err(CoreError::invalid_tenor(s, "empty tenor"));
        };
        let unit = match unit_char {
            'D' => TenorUnit::Day,
            'W' => TenorUnit::Week,
            'M' => TenorUnit::Month,
            'Y' => TenorUnit::Year,
            other => return Err(CoreError::invalid_tenor(s, format!("unknown unit '{other}'"))),
        };
        let amount: i32 = t[..t.len() - 1]
            .parse()
            .map_err(|_| CoreError::invalid_tenor(s, "amount is not an integer"))?;

        Ok(Tenor::new(amount, unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tenors() {
        assert_eq!("3M".parse::<Tenor>().unwrap(), Tenor::months(3));
        assert_eq!("10y".parse::<Tenor>().unwrap(), Tenor::years(10));
        assert_eq!("1W".parse::<Tenor>().unwrap(), Tenor::weeks(1));
        assert_eq!("ON".parse::<Tenor>().unwrap(), Tenor::days(1));
        assert_eq!("TN".parse::<Tenor>().unwrap(), Tenor::days(2));
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<Tenor>().is_err());
        assert!("3Q".parse::<Tenor>().is_err());
        assert!("XM".parse::<Tenor>().is_err());
    }

    #[test]
    fn test_add_to() {
        let d = Date::from_ymd(2025, 1, 15).unwrap();
        assert_eq!(Tenor::weeks(2).add_to(d).unwrap(), Date::from_ymd(2025, 1, 29).unwrap());
        assert_eq!(Tenor::years(2).add_to(d).unwrap(), Date::from_ymd(2027, 1, 15).unwrap());
        assert_eq!(Tenor::months(-1).add_to(d).unwrap(), Date::from_ymd(2024, 12, 15).unwrap());
    }

    #[test]
    fn test_display_and_times() {
        assert_eq!(Tenor::months(3).times(4).to_string(), "12M");
        assert!((Tenor::months(6).year_fraction_estimate() - 0.5).abs() < 1e-15);
    }
}
