//! Day count conventions.
//!
//! A day count converts a pair of dates into an accrual year fraction.
//! Curves measure time on ACT/365 Fixed; instruments accrue on whatever
//! convention their market uses.
//!
//! ```rust
//! use strata_core::daycounts::DayCountConvention;
//! use strata_core::types::Date;
//!
//! let start = Date::from_ymd(2025, 1, 15).unwrap();
//! let end = Date::from_ymd(2025, 7, 15).unwrap();
//! let yf = DayCountConvention::Thirty360.year_fraction(start, end);
//! assert!((yf - 0.5).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Date;

/// Supported day count conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DayCountConvention {
    /// Actual/360, money markets.
    #[default]
    Act360,
    /// Actual/365 Fixed.
    Act365Fixed,
    /// 30/360 US bond basis.
    Thirty360,
    /// Actual/Actual ISDA, splitting the period at year boundaries.
    ActActIsda,
}

impl DayCountConvention {
    /// Market name of the convention.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DayCountConvention::Act360 => "ACT/360",
            DayCountConvention::Act365Fixed => "ACT/365F",
            DayCountConvention::Thirty360 => "30/360",
            DayCountConvention::ActActIsda => "ACT/ACT ISDA",
        }
    }

    /// Day count between two dates under this convention.
    #[must_use]
    pub fn day_count(&self, start: Date, end: Date) -> i64 {
        match self {
            DayCountConvention::Thirty360 => thirty_360_days(start, end),
            _ => start.days_between(&end),
        }
    }

    /// Year fraction from `start` to `end`; negative if `end < start`.
    #[must_use]
    pub fn year_fraction(&self, start: Date, end: Date) -> f64 {
        match self {
            DayCountConvention::Act360 => start.days_between(&end) as f64 / 360.0,
            DayCountConvention::Act365Fixed => start.days_between(&end) as f64 / 365.0,
            DayCountConvention::Thirty360 => thirty_360_days(start, end) as f64 / 360.0,
            DayCountConvention::ActActIsda => {
                if end < start {
                    return -self.year_fraction(end, start);
                }
                act_act_isda(start, end)
            }
        }
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn thirty_360_days(start: Date, end: Date) -> i64 {
    let mut d1 = i64::from(start.day());
    let mut d2 = i64::from(end.day());
    if d1 == 31 {
        d1 = 30;
    }
    if d2 == 31 && d1 == 30 {
        d2 = 30;
    }
    360 * i64::from(end.year() - start.year())
        + 30 * (i64::from(end.month()) - i64::from(start.month()))
        + (d2 - d1)
}

fn act_act_isda(start: Date, end: Date) -> f64 {
    if start.year() == end.year() {
        return start.days_between(&end) as f64 / f64::from(start.days_in_year());
    }

    let mut yf = 0.0;
    let mut cursor = start;
    while cursor.year() < end.year() {
        let Ok(next_jan1) = Date::from_ymd(cursor.year() + 1, 1, 1) else {
            break;
        };
        yf += cursor.days_between(&next_jan1) as f64 / f64::from(cursor.days_in_year());
        cursor = next_jan1;
    }
    yf + cursor.days_between(&end) as f64 / f64::from(cursor.days_in_year())
}
