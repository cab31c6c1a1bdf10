//! Business day adjustment conventions.

use serde::{Deserialize, Serialize};

use super::Calendar;
use crate::error::CoreResult;
use crate::types::{Date, Tenor};

/// How a date falling on a non-business day is rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BusinessDayConvention {
    /// Leave the date as-is.
    Unadjusted,
    /// Next business day.
    Following,
    /// Next business day unless that crosses a month end, then previous.
    #[default]
    ModifiedFollowing,
    /// Previous business day.
    Preceding,
}

impl std::fmt::Display for BusinessDayConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BusinessDayConvention::Unadjusted => "Unadjusted",
            BusinessDayConvention::Following => "Following",
            BusinessDayConvention::ModifiedFollowing => "Modified Following",
            BusinessDayConvention::Preceding => "Preceding",
        };
        write!(f, "{name}")
    }
}

/// Rolls `date` onto a business day according to `convention`.
#[must_use]
pub fn adjust<C: Calendar + ?Sized>(
    date: Date,
    convention: BusinessDayConvention,
    calendar: &C,
) -> Date {
    if calendar.is_business_day(date) {
        return date;
    }

    match convention {
        BusinessDayConvention::Unadjusted => date,
        BusinessDayConvention::Following => following(date, calendar),
        BusinessDayConvention::ModifiedFollowing => {
            let adjusted = following(date, calendar);
            if adjusted.month() != date.month() {
                preceding(date, calendar)
            } else {
                adjusted
            }
        }
        BusinessDayConvention::Preceding => preceding(date, calendar),
    }
}

/// Shifts `date` by `tenor`, then adjusts the result.
pub fn shift<C: Calendar + ?Sized>(
    date: Date,
    tenor: Tenor,
    convention: BusinessDayConvention,
    calendar: &C,
) -> CoreResult<Date> {
    Ok(adjust(tenor.add_to(date)?, convention, calendar))
}

fn following<C: Calendar + ?Sized>(mut date: Date, calendar: &C) -> Date {
    while !calendar.is_business_day(date) {
        date = date.add_days(1);
    }
    date
}

fn preceding<C: Calendar + ?Sized>(mut date: Date, calendar: &C) -> Date {
    while !calendar.is_business_day(date) {
        date = date.add_days(-1);
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendars::WeekendCalendar;

    #[test]
    fn test_following_and_preceding() {
        let sat = Date::from_ymd(2025, 1, 4).unwrap();
        assert_eq!(
            adjust(sat, BusinessDayConvention::Following, &WeekendCalendar),
            Date::from_ymd(2025, 1, 6).unwrap()
        );
        assert_eq!(
            adjust(sat, BusinessDayConvention::Preceding, &WeekendCalendar),
            Date::from_ymd(2025, 1, 3).unwrap()
        );
        assert_eq!(adjust(sat, BusinessDayConvention::Unadjusted, &WeekendCalendar), sat);
    }

    #[test]
    fn test_modified_following_month_end() {
        // 2025-05-31 is a Saturday; following would land in June
        let sat = Date::from_ymd(2025, 5, 31).unwrap();
        assert_eq!(
            adjust(sat, BusinessDayConvention::ModifiedFollowing, &WeekendCalendar),
            Date::from_ymd(2025, 5, 30).unwrap()
        );
    }

    #[test]
    fn test_shift() {
        // 2025-01-15 + 3M = 2025-04-15 (Tuesday)
        let d = Date::from_ymd(2025, 1, 15).unwrap();
        let m = shift(d, Tenor::months(3), BusinessDayConvention::Following, &WeekendCalendar).unwrap();
        assert_eq!(m, Date::from_ymd(2025, 4, 15).unwrap());
    }
}
