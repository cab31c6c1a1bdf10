//! Business day calendars.
//!
//! Instruments build their schedules through [`shift`], which rolls a
//! tenor-shifted date onto a business day of the supplied calendar.

mod conventions;

pub use conventions::{adjust, shift, BusinessDayConvention};

use std::collections::BTreeSet;

use crate::types::Date;

/// A holiday calendar.
pub trait Calendar: Send + Sync {
    /// Calendar name.
    fn name(&self) -> &str;

    /// Whether `date` is a business day.
    fn is_business_day(&self, date: Date) -> bool;

    /// Adds `days` business days (negative moves backwards).
    fn add_business_days(&self, date: Date, days: i32) -> Date {
        let step = if days >= 0 { 1 } else { -1 };
        let mut remaining = days.abs();
        let mut current = date;
        while remaining > 0 {
            current = current.add_days(step);
            if self.is_business_day(current) {
                remaining -= 1;
            }
        }
        current
    }
}

/// Calendar where every weekday is a business day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekendCalendar;

impl Calendar for WeekendCalendar {
    fn name(&self) -> &str {
        "Weekend"
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.is_weekend()
    }
}

/// Weekends plus an explicit holiday list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    name: String,
    holidays: BTreeSet<Date>,
}

impl HolidayCalendar {
    /// Creates a calendar with the given holidays.
    #[must_use]
    pub fn new(name: impl Into<String>, holidays: impl IntoIterator<Item = Date>) -> Self {
        Self {
            name: name.into(),
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Adds a holiday.
    #[must_use]
    pub fn with_holiday(mut self, date: Date) -> Self {
        self.holidays.insert(date);
        self
    }

    /// Number of explicit holidays.
    #[must_use]
    pub fn holiday_count(&self) -> usize {
        self.holidays.len()
    }
}

impl Calendar for HolidayCalendar {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.is_weekend() && !self.holidays.contains(&date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holiday_calendar() {
        let xmas = Date::from_ymd(2025, 12, 25).unwrap();
        let cal = HolidayCalendar::new("TEST", [xmas]);
        assert!(!cal.is_business_day(xmas));
        assert!(cal.is_business_day(Date::from_ymd(2025, 12, 24).unwrap()));
        assert_eq!(cal.holiday_count(), 1);
    }

    #[test]
    fn test_add_business_days() {
        // Friday 2025-01-03 + 1 business day = Monday 2025-01-06
        let fri = Date::from_ymd(2025, 1, 3).unwrap();
        assert_eq!(
            WeekendCalendar.add_business_days(fri, 1),
            Date::from_ymd(2025, 1, 6).unwrap()
        );
        assert_eq!(
            WeekendCalendar.add_business_days(Date::from_ymd(2025, 1, 6).unwrap(), -1),
            fri
        );
    }
}
