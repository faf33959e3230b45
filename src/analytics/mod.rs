pub mod aggregate;
pub mod calendar;
pub mod error;

pub use aggregate::{
    aggregate, available_years, daily_count_distribution, daily_trend, filter_daily, summarize,
    weekday_hour_matrix, Aggregates, CountDistribution, DailyBucket, HistogramBin, MailSummary,
    RhythmMatrix, TrendPoint, TrendSeries, WeekdayBucket, WeeklyBucket,
};
pub use calendar::{
    bin_calendar, max_iso_week, week_column, CalendarExport, CalendarFilter, CalendarGrid,
    HourRange, WEEKDAY_LABELS,
};
pub use error::AnalyticsError;
