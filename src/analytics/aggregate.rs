//! Day, ISO-week, weekday and weekday × hour bucketing.

use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::mail::{DateRange, Direction, DirectionSet, MailEvent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub direction: Direction,
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyBucket {
    pub direction: Direction,
    pub iso_year: i32,
    pub iso_week: u32,
    pub count: u64,
}

impl WeeklyBucket {
    /// Monday of this ISO week
    pub fn week_start(&self) -> Option<NaiveDate> {
        NaiveDate::from_isoywd_opt(self.iso_year, self.iso_week, Weekday::Mon)
    }

    pub fn label(&self) -> String {
        format!("{}-W{:02}", self.iso_year, self.iso_week)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayBucket {
    pub direction: Direction,
    pub weekday: Weekday,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregates {
    pub per_day: Vec<DailyBucket>,
    pub per_week: Vec<WeeklyBucket>,
    pub per_weekday: Vec<WeekdayBucket>,
}

/// Group events per (direction, date), (direction, ISO week) and (direction, weekday).
/// Rows come back sorted by key.
pub fn aggregate(events: &[MailEvent]) -> Aggregates {
    let mut days: BTreeMap<(Direction, NaiveDate), u64> = BTreeMap::new();
    let mut weeks: BTreeMap<(Direction, i32, u32), u64> = BTreeMap::new();
    let mut weekdays: BTreeMap<(Direction, u32), u64> = BTreeMap::new();

    for event in events {
        let date = event.date();
        let iso = date.iso_week();
        *days.entry((event.direction, date)).or_default() += 1;
        *weeks
            .entry((event.direction, iso.year(), iso.week()))
            .or_default() += 1;
        *weekdays
            .entry((event.direction, date.weekday().num_days_from_monday()))
            .or_default() += 1;
    }

    Aggregates {
        per_day: days
            .into_iter()
            .map(|((direction, date), count)| DailyBucket {
                direction,
                date,
                count,
            })
            .collect(),
        per_week: weeks
            .into_iter()
            .map(|((direction, iso_year, iso_week), count)| WeeklyBucket {
                direction,
                iso_year,
                iso_week,
                count,
            })
            .collect(),
        per_weekday: weekdays
            .into_iter()
            .filter_map(|((direction, day), count)| {
                let weekday = Weekday::try_from(day as u8).ok()?;
                Some(WeekdayBucket {
                    direction,
                    weekday,
                    count,
                })
            })
            .collect(),
    }
}

/// Weekday × hour-of-day counts for one direction (rows Monday..Sunday, columns 0..24)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RhythmMatrix {
    pub direction: Direction,
    pub counts: [[u64; 24]; 7],
}

impl RhythmMatrix {
    pub fn max_count(&self) -> u64 {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }
}

pub fn weekday_hour_matrix(events: &[MailEvent], direction: Direction) -> RhythmMatrix {
    let mut counts = [[0u64; 24]; 7];
    for event in events.iter().filter(|e| e.direction == direction) {
        let weekday = event.timestamp.weekday().num_days_from_monday() as usize;
        counts[weekday][event.timestamp.hour() as usize] += 1;
    }
    RhythmMatrix { direction, counts }
}

/// Keep daily rows for the given directions inside `range`
pub fn filter_daily<'a>(
    per_day: &'a [DailyBucket],
    directions: DirectionSet,
    range: DateRange,
) -> impl Iterator<Item = &'a DailyBucket> + 'a {
    per_day
        .iter()
        .filter(move |b| directions.contains(b.direction) && range.contains_date(b.date))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub count: u64,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub direction: Direction,
    pub points: Vec<TrendPoint>,
}

/// Daily counts per direction over a dense date axis with a trailing moving
/// average of `window` days. Days without mail count as zero; the first
/// days average over however many days exist so far.
///
/// The window spans calendar days, not rows of `per_day`: a gap of quiet days
/// pulls the average down instead of being skipped over.
pub fn daily_trend(
    per_day: &[DailyBucket],
    directions: DirectionSet,
    range: DateRange,
    window: usize,
) -> Vec<TrendSeries> {
    let window = window.max(1);
    let rows: Vec<&DailyBucket> = filter_daily(per_day, directions, range).collect();

    let (Some(first), Some(last)) = (
        rows.iter().map(|b| b.date).min(),
        rows.iter().map(|b| b.date).max(),
    ) else {
        return Vec::new();
    };

    directions
        .iter()
        .map(|direction| {
            let by_date: BTreeMap<NaiveDate, u64> = rows
                .iter()
                .filter(|b| b.direction == direction)
                .map(|b| (b.date, b.count))
                .collect();

            let counts: Vec<(NaiveDate, u64)> = first
                .iter_days()
                .take_while(|d| *d <= last)
                .map(|d| (d, by_date.get(&d).copied().unwrap_or(0)))
                .collect();

            let mut running = 0u64;
            let points = counts
                .iter()
                .enumerate()
                .map(|(i, &(date, count))| {
                    running += count;
                    if i >= window {
                        running -= counts[i - window].1;
                    }
                    let span = (i + 1).min(window);
                    TrendPoint {
                        date,
                        count,
                        average: running as f64 / span as f64,
                    }
                })
                .collect();

            TrendSeries { direction, points }
        })
        .collect()
}

/// Headline totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MailSummary {
    pub incoming: u64,
    pub outgoing: u64,
}

impl MailSummary {
    pub fn total(&self) -> u64 {
        self.incoming + self.outgoing
    }

    /// Incoming per outgoing mail, `None` when nothing was sent
    pub fn ratio(&self) -> Option<f64> {
        (self.outgoing > 0).then(|| self.incoming as f64 / self.outgoing as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub low: f64,
    pub high: f64,
    /// Days whose count falls in `[low, high)`, the last bin also takes `high`
    pub days: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountDistribution {
    pub direction: Direction,
    pub bins: Vec<HistogramBin>,
}

impl CountDistribution {
    pub fn max_days(&self) -> u64 {
        self.bins.iter().map(|b| b.days).max().unwrap_or(0)
    }
}

/// Histogram of mails per day for one direction, over the days that have mail.
/// `bins` equal-width bins span the smallest to the largest daily count; when
/// every day has the same count the range is widened by half a mail each way.
pub fn daily_count_distribution(
    per_day: &[DailyBucket],
    direction: Direction,
    bins: usize,
) -> CountDistribution {
    let bins = bins.max(1);
    let counts: Vec<u64> = per_day
        .iter()
        .filter(|b| b.direction == direction)
        .map(|b| b.count)
        .collect();

    let (Some(&min), Some(&max)) = (counts.iter().min(), counts.iter().max()) else {
        return CountDistribution {
            direction,
            bins: Vec::new(),
        };
    };
    let (low, high) = if min == max {
        (min as f64 - 0.5, max as f64 + 0.5)
    } else {
        (min as f64, max as f64)
    };
    let width = (high - low) / bins as f64;

    let mut days = vec![0u64; bins];
    for count in counts {
        let i = ((count as f64 - low) / width) as usize;
        days[i.min(bins - 1)] += 1;
    }

    CountDistribution {
        direction,
        bins: days
            .into_iter()
            .enumerate()
            .map(|(i, days)| HistogramBin {
                low: low + width * i as f64,
                high: low + width * (i + 1) as f64,
                days,
            })
            .collect(),
    }
}

pub fn summarize(per_day: &[DailyBucket]) -> MailSummary {
    per_day
        .iter()
        .fold(MailSummary::default(), |mut acc, b| {
            match b.direction {
                Direction::Incoming => acc.incoming += b.count,
                Direction::Outgoing => acc.outgoing += b.count,
            }
            acc
        })
}

/// Gregorian years present in the events, ascending
pub fn available_years(events: &[MailEvent]) -> Vec<i32> {
    let mut years: Vec<i32> = events.iter().map(|e| e.timestamp.year()).collect();
    years.sort_unstable();
    years.dedup();
    years
}
