//! Domain types for calibration inputs.

mod currency;
mod date;
mod frequency;
mod tenor;

pub use currency::Currency;
pub use date::Date;
pub use frequency::Frequency;
pub use tenor::{Tenor, TenorUnit};
