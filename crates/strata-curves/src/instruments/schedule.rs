//! Payment schedules.

use strata_core::calendars::{adjust, BusinessDayConvention, Calendar, WeekendCalendar};
use strata_core::types::{Date, Frequency};

use crate::error::{CurveError, CurveResult};

/// Period boundaries `[start, d1, ..., end]` rolling forward from `start`.
///
/// Intermediate dates are `start + k` periods, rolled Modified Following on
/// `calendar`; `start` and `end` are kept as given. A final short stub is
/// allowed.
pub fn generate_schedule<C: Calendar + ?Sized>(
    start: Date,
    end: Date,
    frequency: Frequency,
    calendar: &C,
) -> CurveResult<Vec<Date>> {
    if end <= start {
        return Err(CurveError::invalid_instrument(format!(
            "schedule end {end} not after start {start}"
        )));
    }

    let step = frequency.months_per_period() as i32;
    let mut dates = vec![start];
    for k in 1.. {
        let unadjusted = start.add_months(step * k)?;
        if unadjusted >= end {
            break;
        }
        let date = adjust(unadjusted, BusinessDayConvention::ModifiedFollowing, calendar);
        if date >= end {
            break;
        }
        dates.push(date);
    }
    dates.push(end);
    Ok(dates)
}

/// Schedule on the weekend-only calendar.
pub(crate) fn weekend_schedule(start: Date, end: Date, frequency: Frequency) -> CurveResult<Vec<Date>> {
    generate_schedule(start, end, frequency, &WeekendCalendar)
}
