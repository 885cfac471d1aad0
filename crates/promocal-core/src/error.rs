//! Errors raised at the boundary of the layout engine.
//!
//! The layout functions themselves are infallible once their inputs exist;
//! everything here is about rejecting records that should never reach them.

use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LayoutError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Not a zero-padded `YYYY-MM-DD` calendar date.
    #[error("invalid calendar date {raw:?}: expected YYYY-MM-DD")]
    InvalidDate { raw: String },

    /// A range whose end precedes its start. Never reordered silently.
    #[error("{kind} {id:?} ends on {end} before it starts on {start}")]
    InvertedRange {
        kind: &'static str,
        id: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("{kind} id must not be empty")]
    EmptyId { kind: &'static str },

    /// Year/month/day arithmetic left the representable calendar.
    #[error("date out of range: year {year}, month {month}, day {day}")]
    DateOutOfRange { year: i32, month: i32, day: i32 },
}
