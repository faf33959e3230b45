//! CSV tables shared between ingestion and analysis.
//!
//! Column names are the contract with other tools reading these files:
//! `direction,date,count`, `direction,year,week,count`,
//! `direction,weekday,count` and the raw `direction,datetime` event table.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Weekday};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analytics::{aggregate, Aggregates, DailyBucket, WeekdayBucket, WeeklyBucket};
use crate::mail::{DateRange, Direction, MailEvent, MailSource};

pub const RAW_FILE: &str = "mail_raw.csv";
pub const DAILY_FILE: &str = "mail_counts_per_day.csv";
pub const WEEKLY_FILE: &str = "mail_counts_per_week.csv";
pub const WEEKDAY_FILE: &str = "mail_counts_per_weekday.csv";

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Serialize, Deserialize)]
struct DailyRow {
    direction: Direction,
    date: NaiveDate,
    count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct WeeklyRow {
    direction: Direction,
    year: i32,
    week: u32,
    count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct WeekdayRow {
    direction: Direction,
    weekday: String,
    count: u64,
}

/// Raw rows are read as text so a single bad timestamp drops one row, not the file
#[derive(Debug, Serialize, Deserialize)]
struct RawRow {
    direction: String,
    datetime: String,
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parse the timestamp formats found in exported raw tables.
/// Zoned timestamps are converted to UTC and the zone is dropped.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    for format in [
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%z",
    ] {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.naive_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row.with_context(|| format!("Malformed row in {}", path.display()))?);
    }
    Ok(rows)
}

pub fn write_daily(path: &Path, buckets: &[DailyBucket]) -> Result<()> {
    write_rows(
        path,
        buckets.iter().map(|b| DailyRow {
            direction: b.direction,
            date: b.date,
            count: b.count,
        }),
    )
}

pub fn read_daily(path: &Path) -> Result<Vec<DailyBucket>> {
    Ok(read_rows::<DailyRow>(path)?
        .into_iter()
        .map(|r| DailyBucket {
            direction: r.direction,
            date: r.date,
            count: r.count,
        })
        .collect())
}

pub fn write_weekly(path: &Path, buckets: &[WeeklyBucket]) -> Result<()> {
    write_rows(
        path,
        buckets.iter().map(|b| WeeklyRow {
            direction: b.direction,
            year: b.iso_year,
            week: b.iso_week,
            count: b.count,
        }),
    )
}

pub fn read_weekly(path: &Path) -> Result<Vec<WeeklyBucket>> {
    Ok(read_rows::<WeeklyRow>(path)?
        .into_iter()
        .map(|r| WeeklyBucket {
            direction: r.direction,
            iso_year: r.year,
            iso_week: r.week,
            count: r.count,
        })
        .collect())
}

pub fn write_weekday(path: &Path, buckets: &[WeekdayBucket]) -> Result<()> {
    write_rows(
        path,
        buckets.iter().map(|b| WeekdayRow {
            direction: b.direction,
            weekday: weekday_name(b.weekday).to_string(),
            count: b.count,
        }),
    )
}

pub fn read_weekday(path: &Path) -> Result<Vec<WeekdayBucket>> {
    read_rows::<WeekdayRow>(path)?
        .into_iter()
        .map(|r| {
            let weekday = r
                .weekday
                .parse::<Weekday>()
                .map_err(|_| anyhow::anyhow!("Unknown weekday: {}", r.weekday))?;
            Ok(WeekdayBucket {
                direction: r.direction,
                weekday,
                count: r.count,
            })
        })
        .collect()
}

pub fn write_raw(path: &Path, events: &[MailEvent]) -> Result<()> {
    write_rows(
        path,
        events.iter().map(|e| RawRow {
            direction: e.direction.to_string(),
            datetime: e.timestamp.format(DATETIME_FORMAT).to_string(),
        }),
    )
}

/// Raw events plus the number of rows that had to be dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLoad {
    pub events: Vec<MailEvent>,
    pub dropped: usize,
}

/// Read the raw event table, dropping rows with unknown direction or unparsable datetime
pub fn read_raw(path: &Path) -> Result<RawLoad> {
    let mut load = RawLoad::default();
    for row in read_rows::<RawRow>(path)? {
        let direction = row.direction.parse::<Direction>().ok();
        let timestamp = parse_datetime(&row.datetime);
        match (direction, timestamp) {
            (Some(direction), Some(timestamp)) => {
                load.events.push(MailEvent::new(direction, timestamp))
            }
            _ => {
                tracing::debug!(?row, "Dropping raw row");
                load.dropped += 1;
            }
        }
    }
    if load.dropped > 0 {
        tracing::warn!(
            path = %path.display(),
            dropped = load.dropped,
            "Dropped raw rows with invalid direction or datetime"
        );
    }
    Ok(load)
}

/// Write all four tables into `dir` and return the aggregates that were written
pub fn export_all(dir: &Path, events: &[MailEvent]) -> Result<Aggregates> {
    std::fs::create_dir_all(dir)?;
    let aggregates = aggregate(events);

    write_raw(&dir.join(RAW_FILE), events)?;
    write_daily(&dir.join(DAILY_FILE), &aggregates.per_day)?;
    write_weekly(&dir.join(WEEKLY_FILE), &aggregates.per_week)?;
    write_weekday(&dir.join(WEEKDAY_FILE), &aggregates.per_weekday)?;

    tracing::info!(
        dir = %dir.display(),
        events = events.len(),
        days = aggregates.per_day.len(),
        weeks = aggregates.per_week.len(),
        "exported tables"
    );

    Ok(aggregates)
}

/// Events replayed from an exported raw table
#[derive(Debug, Clone)]
pub struct RawCsvSource {
    path: PathBuf,
}

impl RawCsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MailSource for RawCsvSource {
    fn fetch(&self, range: &DateRange) -> Result<Vec<MailEvent>> {
        let load = read_raw(&self.path)?;
        Ok(load
            .events
            .into_iter()
            .filter(|e| range.contains(&e.timestamp))
            .collect())
    }
}
