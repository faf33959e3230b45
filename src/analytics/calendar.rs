//! ISO-week calendar heatmap binning.
//!
//! Turns a list of mail events into a dense weekday × ISO-week grid for one
//! Gregorian year. Rows are weekdays (Monday = 0), columns run from 0 to
//! `max_week + 1` where `max_week` is the ISO week of Dec 28. Column 0 holds
//! days whose ISO week belongs to the previous ISO year (early January) and
//! column `max_week + 1` holds days already counted in the next ISO year
//! (late December).

use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use super::error::{AnalyticsError, Result};
use crate::mail::{DirectionSet, MailEvent};

pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Half-open hour-of-day window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourRange {
    start: u32,
    end: u32,
}

impl HourRange {
    /// Validates `0 <= start < end <= 24`. An end of 24 keeps the whole 23:xx hour.
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start >= end || end > 24 {
            return Err(AnalyticsError::InvalidHourRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.start && hour < self.end
    }
}

impl fmt::Display for HourRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start, self.end)
    }
}

/// Filter predicates applied before binning. All of them must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFilter {
    pub year: i32,
    pub directions: DirectionSet,
    pub hours: Option<HourRange>,
    pub weekdays_only: bool,
}

impl CalendarFilter {
    /// Everything in `year`, both directions, all hours and days
    pub fn year(year: i32) -> Self {
        Self {
            year,
            directions: DirectionSet::all(),
            hours: None,
            weekdays_only: false,
        }
    }

    pub fn matches(&self, event: &MailEvent) -> bool {
        let ts = &event.timestamp;
        ts.year() == self.year
            && self.directions.contains(event.direction)
            && self.hours.is_none_or(|h| h.contains(ts.hour()))
            && (!self.weekdays_only || ts.weekday().num_days_from_monday() < 5)
    }
}

/// ISO week number of Dec 28, i.e. the last ISO week of `year`
pub fn max_iso_week(year: i32) -> Result<u32> {
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(|d| d.iso_week().week())
        .ok_or(AnalyticsError::YearOutOfRange(year))
}

/// Grid column for `date` when visualizing `year`
pub fn week_column(date: NaiveDate, year: i32, max_week: u32) -> usize {
    let iso = date.iso_week();
    let week = match iso.year().cmp(&year) {
        Ordering::Less => 0,
        Ordering::Greater => max_week + 1,
        Ordering::Equal => iso.week(),
    };
    week as usize
}

/// Dense weekday × ISO-week count grid with the date behind every populated cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGrid {
    year: i32,
    max_week: u32,
    counts: Vec<Vec<u64>>,
    dates: BTreeMap<(usize, usize), NaiveDate>,
}

impl CalendarGrid {
    fn empty(year: i32, max_week: u32) -> Self {
        let columns = max_week as usize + 2;
        Self {
            year,
            max_week,
            counts: vec![vec![0; columns]; WEEKDAY_LABELS.len()],
            dates: BTreeMap::new(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn max_week(&self) -> u32 {
        self.max_week
    }

    /// Column domain, including both spillover columns
    pub fn weeks(&self) -> RangeInclusive<usize> {
        0..=self.max_week as usize + 1
    }

    pub fn column_count(&self) -> usize {
        self.max_week as usize + 2
    }

    /// Rows indexed by weekday (Monday = 0), columns by week index
    pub fn counts(&self) -> &[Vec<u64>] {
        &self.counts
    }

    pub fn count(&self, weekday: usize, week: usize) -> u64 {
        self.counts
            .get(weekday)
            .and_then(|row| row.get(week))
            .copied()
            .unwrap_or(0)
    }

    pub fn date_at(&self, weekday: usize, week: usize) -> Option<NaiveDate> {
        self.dates.get(&(weekday, week)).copied()
    }

    pub fn date_lookup(&self) -> &BTreeMap<(usize, usize), NaiveDate> {
        &self.dates
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }

    pub fn is_spillover_column(&self, week: usize) -> bool {
        week == 0 || week == self.max_week as usize + 1
    }

    /// Date strings per cell, empty where nothing was binned
    pub fn hover_labels(&self) -> Vec<Vec<String>> {
        (0..WEEKDAY_LABELS.len())
            .map(|wd| {
                self.weeks()
                    .map(|wk| {
                        self.date_at(wd, wk)
                            .map(|d| d.format("%Y-%m-%d").to_string())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }

    pub fn export(&self) -> CalendarExport {
        CalendarExport {
            year: self.year,
            max_week: self.max_week,
            weeks: self.weeks().collect(),
            weekdays: WEEKDAY_LABELS,
            counts: self.counts.clone(),
            dates: self.hover_labels(),
        }
    }
}

/// Renderer-facing snapshot of a grid
#[derive(Debug, Clone, Serialize)]
pub struct CalendarExport {
    pub year: i32,
    pub max_week: u32,
    pub weeks: Vec<usize>,
    pub weekdays: [&'static str; 7],
    pub counts: Vec<Vec<u64>>,
    pub dates: Vec<Vec<String>>,
}

/// Bin events into the calendar grid for `filter.year`.
///
/// Returns [`AnalyticsError::NoData`] when nothing survives the filters so
/// callers can tell "no data" apart from a grid of zeros.
pub fn bin_calendar(events: &[MailEvent], filter: &CalendarFilter) -> Result<CalendarGrid> {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for event in events.iter().filter(|e| filter.matches(e)) {
        *per_day.entry(event.date()).or_default() += 1;
    }

    if per_day.is_empty() {
        return Err(AnalyticsError::NoData {
            year: filter.year,
            directions: filter.directions,
        });
    }

    let max_week = max_iso_week(filter.year)?;
    let mut grid = CalendarGrid::empty(filter.year, max_week);

    for (date, count) in per_day {
        let weekday = date.weekday().num_days_from_monday() as usize;
        let week = week_column(date, filter.year, max_week);
        grid.counts[weekday][week] += count;
        grid.dates.insert((weekday, week), date);
    }

    tracing::debug!(
        year = filter.year,
        max_week,
        days = grid.dates.len(),
        total = grid.total(),
        "binned calendar"
    );

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::Direction;
    use chrono::NaiveDateTime;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn incoming(s: &str) -> MailEvent {
        MailEvent::new(Direction::Incoming, at(s))
    }

    fn outgoing(s: &str) -> MailEvent {
        MailEvent::new(Direction::Outgoing, at(s))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_hour_range_validation() {
        assert!(HourRange::new(8, 18).is_ok());
        assert!(HourRange::new(0, 24).is_ok());
        assert_eq!(
            HourRange::new(18, 8),
            Err(AnalyticsError::InvalidHourRange { start: 18, end: 8 })
        );
        assert!(HourRange::new(8, 8).is_err());
        assert!(HourRange::new(0, 25).is_err());
    }

    #[test]
    fn test_hour_range_end_24_includes_last_hour() {
        let hours = HourRange::new(20, 24).unwrap();
        assert!(hours.contains(23));
        assert!(!hours.contains(19));

        let mut filter = CalendarFilter::year(2025);
        filter.hours = Some(hours);
        let grid = bin_calendar(&[incoming("2025-03-03 23:59")], &filter).unwrap();
        assert_eq!(grid.total(), 1);
    }

    #[test]
    fn test_hour_filter_boundary_is_half_open() {
        let mut filter = CalendarFilter::year(2025);
        filter.hours = Some(HourRange::new(8, 18).unwrap());

        let events = [incoming("2025-03-04 17:59"), incoming("2025-03-05 18:00")];
        let grid = bin_calendar(&events, &filter).unwrap();
        assert_eq!(grid.total(), 1);
        assert_eq!(grid.date_at(1, 10), Some(date(2025, 3, 4)));
        assert_eq!(grid.date_at(2, 10), None);
    }

    #[test]
    fn test_working_hours_scenario() {
        let events = [incoming("2025-01-06 09:00"), incoming("2025-01-06 20:00")];
        let mut filter = CalendarFilter::year(2025);
        filter.hours = Some(HourRange::new(8, 18).unwrap());

        let grid = bin_calendar(&events, &filter).unwrap();
        assert_eq!(grid.count(0, 2), 1);
        assert_eq!(grid.total(), 1);
        assert_eq!(grid.date_lookup().len(), 1);
        assert_eq!(grid.date_at(0, 2), Some(date(2025, 1, 6)));
    }

    #[test]
    fn test_empty_selection_is_no_data() {
        let filter = CalendarFilter::year(2025);
        assert_eq!(
            bin_calendar(&[], &filter),
            Err(AnalyticsError::NoData {
                year: 2025,
                directions: DirectionSet::all()
            })
        );

        // data exists, but not for the selected direction
        let mut filter = CalendarFilter::year(2025);
        filter.directions = DirectionSet::only(Direction::Outgoing);
        let result = bin_calendar(&[incoming("2025-05-05 10:00")], &filter);
        assert!(matches!(result, Err(AnalyticsError::NoData { .. })));

        // a year with no events at all
        let result = bin_calendar(&[incoming("2025-05-05 10:00")], &CalendarFilter::year(1999));
        assert!(matches!(result, Err(AnalyticsError::NoData { year: 1999, .. })));
    }

    #[test]
    fn test_53_week_year_has_55_columns() {
        assert_eq!(max_iso_week(2020).unwrap(), 53);
        let grid = bin_calendar(&[incoming("2020-12-28 10:00")], &CalendarFilter::year(2020))
            .unwrap();
        assert_eq!(grid.weeks(), 0..=54);
        assert_eq!(grid.column_count(), 55);
        assert_eq!(grid.count(0, 53), 1);
        assert!(grid.counts().iter().all(|row| row.len() == 55));
    }

    #[test]
    fn test_52_week_year_column_domain() {
        assert_eq!(max_iso_week(2021).unwrap(), 52);
        assert_eq!(max_iso_week(2025).unwrap(), 52);
        let grid = bin_calendar(&[incoming("2021-06-01 10:00")], &CalendarFilter::year(2021))
            .unwrap();
        assert_eq!(grid.weeks(), 0..=53);
    }

    #[test]
    fn test_previous_year_spillover_lands_in_column_zero() {
        // 2021-01-01 is a Friday in ISO week 53 of 2020
        let grid = bin_calendar(&[incoming("2021-01-01 12:00")], &CalendarFilter::year(2021))
            .unwrap();
        assert_eq!(grid.count(4, 0), 1);
        assert_eq!(grid.count(4, 1), 0);
        assert_eq!(grid.date_at(4, 0), Some(date(2021, 1, 1)));
    }

    #[test]
    fn test_next_year_spillover_lands_in_last_column() {
        // 2019-12-30 and 2019-12-31 belong to ISO week 1 of 2020
        let events = [incoming("2019-12-30 09:00"), outgoing("2019-12-31 09:00")];
        let grid = bin_calendar(&events, &CalendarFilter::year(2019)).unwrap();
        assert_eq!(grid.max_week(), 52);
        assert_eq!(grid.count(0, 53), 1);
        assert_eq!(grid.count(1, 53), 1);
        assert_eq!(grid.count(0, 1), 0);
    }

    fn every_day(year: i32, direction: Direction) -> Vec<MailEvent> {
        date(year, 1, 1)
            .iter_days()
            .take_while(|d| d.year() == year)
            .map(|d| MailEvent::new(direction, d.and_hms_opt(10, 0, 0).unwrap()))
            .collect()
    }

    #[test]
    fn test_spillover_columns_only_hold_foreign_iso_year_dates() {
        for year in [2019, 2020, 2021, 2024, 2027] {
            let grid =
                bin_calendar(&every_day(year, Direction::Incoming), &CalendarFilter::year(year))
                    .unwrap();
            for (&(_, week), d) in grid.date_lookup() {
                if grid.is_spillover_column(week) {
                    assert_ne!(d.iso_week().year(), year, "{} in column {}", d, week);
                } else {
                    assert_eq!(d.iso_week().year(), year);
                    assert_eq!(d.iso_week().week() as usize, week);
                }
            }
        }
    }

    #[test]
    fn test_every_day_of_year_maps_to_exactly_one_cell() {
        let year = 2026;
        let events = every_day(year, Direction::Outgoing);
        let grid = bin_calendar(&events, &CalendarFilter::year(year)).unwrap();
        assert_eq!(grid.total(), 365);
        assert_eq!(grid.date_lookup().len(), 365);
        for (&(wd, wk), d) in grid.date_lookup() {
            assert_eq!(grid.count(wd, wk), 1);
            assert_eq!(d.weekday().num_days_from_monday() as usize, wd);
        }
    }

    #[test]
    fn test_same_day_events_sum_into_one_cell() {
        let events = [
            incoming("2025-07-14 08:00"),
            incoming("2025-07-14 12:30"),
            outgoing("2025-07-14 17:45"),
        ];
        let grid = bin_calendar(&events, &CalendarFilter::year(2025)).unwrap();
        assert_eq!(grid.count(0, 29), 3);
        assert_eq!(grid.date_lookup().len(), 1);
    }

    #[test]
    fn test_sum_matches_filtered_count_and_is_idempotent() {
        let events = [
            incoming("2025-02-01 07:00"), // Saturday
            incoming("2025-02-03 09:15"),
            outgoing("2025-02-03 10:00"),
            outgoing("2025-02-04 19:00"),
            incoming("2024-12-31 10:00"), // other year
            incoming("2025-12-31 11:00"), // ISO 2026-W01
        ];
        let filter = CalendarFilter {
            year: 2025,
            directions: DirectionSet::all(),
            hours: Some(HourRange::new(8, 18).unwrap()),
            weekdays_only: true,
        };
        let surviving = events.iter().filter(|e| filter.matches(e)).count() as u64;
        let first = bin_calendar(&events, &filter).unwrap();
        let second = bin_calendar(&events, &filter).unwrap();
        assert_eq!(surviving, 3);
        assert_eq!(first.total(), surviving);
        assert_eq!(first, second);
        assert_eq!(first.count(2, 53), 1);
    }

    #[test]
    fn test_weekdays_only_drops_weekend() {
        let mut filter = CalendarFilter::year(2025);
        filter.weekdays_only = true;
        let events = [incoming("2025-03-08 10:00"), incoming("2025-03-09 10:00")];
        assert!(matches!(
            bin_calendar(&events, &filter),
            Err(AnalyticsError::NoData { .. })
        ));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut events = vec![
            incoming("2025-04-01 10:00"),
            outgoing("2025-01-02 10:00"),
            incoming("2025-12-30 10:00"),
        ];
        let filter = CalendarFilter::year(2025);
        let forward = bin_calendar(&events, &filter).unwrap();
        events.reverse();
        assert_eq!(bin_calendar(&events, &filter).unwrap(), forward);
    }

    #[test]
    fn test_export_has_hover_labels() {
        let grid = bin_calendar(&[incoming("2025-01-06 09:00")], &CalendarFilter::year(2025))
            .unwrap();
        let export = grid.export();
        assert_eq!(export.weeks.len(), 54);
        assert_eq!(export.dates[0][2], "2025-01-06");
        assert_eq!(export.dates[1][2], "");
        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["weekdays"][6], "Sun");
        assert_eq!(json["counts"][0][2], 1);
    }
}
