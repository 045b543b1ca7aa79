//! Command implementations.
//!
//! Commands return the text they print so they can run against a
//! temporary catalog in tests; `main` does the printing.

pub mod add;
pub mod config;
pub mod modify;
pub mod query;

use chrono::{Local, NaiveDate};

/// Today's date in the local time zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
