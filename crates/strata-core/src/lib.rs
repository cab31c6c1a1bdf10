//! # Strata Core
//!
//! Core types and date services for the Strata calibration library.
//!
//! This crate provides the foundational building blocks shared by the
//! curve and smile crates:
//!
//! - **Types**: `Date`, `Tenor`, `Frequency`, `Currency`
//! - **Day Count Conventions**: year fractions for accrual and discounting
//! - **Business Day Calendars**: weekend/holiday calendars and date rolling
//! - **Traits**: market data abstractions shared across crates (`VolSurface`)
//!
//! ## Example
//!
//! ```rust
//! use strata_core::prelude::*;
//!
//! let spot = Date::from_ymd(2025, 1, 15).unwrap();
//! let tenor: Tenor = "3M".parse().unwrap();
//! let maturity = shift(spot, tenor, BusinessDayConvention::ModifiedFollowing, &WeekendCalendar).unwrap();
//! let tau = DayCountConvention::Act360.year_fraction(spot, maturity);
//! assert!(tau > 0.24 && tau < 0.26);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::unused_self)]

pub mod calendars;
pub mod daycounts;
pub mod error;
pub mod traits;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::calendars::{
        adjust, shift, BusinessDayConvention, Calendar, HolidayCalendar, WeekendCalendar,
    };
    pub use crate::daycounts::DayCountConvention;
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::traits::{FlatVolSurface, VolSurface};
    pub use crate::types::{Currency, Date, Frequency, Tenor, TenorUnit};
}

pub use error::{CoreError, CoreResult};
