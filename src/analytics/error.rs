use thiserror::Error;

use crate::mail::DirectionSet;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    #[error("invalid hour range {start}..{end}: expected 0 <= start < end <= 24")]
    InvalidHourRange { start: u32, end: u32 },

    #[error("no data for year {year} / directions {directions}")]
    NoData { year: i32, directions: DirectionSet },

    #[error("year {0} is outside the supported calendar range")]
    YearOutOfRange(i32),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
