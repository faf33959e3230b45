use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a message was received or sent by the account owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Incoming, Direction::Outgoing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "incoming" => Ok(Direction::Incoming),
            "outgoing" => Ok(Direction::Outgoing),
            other => Err(anyhow::anyhow!("Unknown direction: {}", other)),
        }
    }
}

/// A single timestamped mail, timezone already dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct MailEvent {
    pub direction: Direction,
    pub timestamp: NaiveDateTime,
}

impl MailEvent {
    pub fn new(direction: Direction, timestamp: NaiveDateTime) -> Self {
        Self {
            direction,
            timestamp,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Parsed mail file with the fields needed for de-duplication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedMail {
    pub event: MailEvent,
    #[serde(default)]
    pub message_id: Option<String>,
}

/// Cached scan result with file modification time for invalidation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedMail {
    pub mail: ScannedMail,
    pub mtime: u64, // File modification time in seconds since epoch
}

/// Inclusive calendar date range used to restrict ingestion.
/// Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }

    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        self.contains_date(timestamp.date())
    }
}

/// A set of directions to keep when filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct DirectionSet {
    pub incoming: bool,
    pub outgoing: bool,
}

impl DirectionSet {
    pub fn all() -> Self {
        Self {
            incoming: true,
            outgoing: true,
        }
    }

    pub fn none() -> Self {
        Self {
            incoming: false,
            outgoing: false,
        }
    }

    pub fn only(direction: Direction) -> Self {
        let mut set = Self::none();
        set.insert(direction);
        set
    }

    pub fn contains(&self, direction: Direction) -> bool {
        match direction {
            Direction::Incoming => self.incoming,
            Direction::Outgoing => self.outgoing,
        }
    }

    pub fn insert(&mut self, direction: Direction) {
        match direction {
            Direction::Incoming => self.incoming = true,
            Direction::Outgoing => self.outgoing = true,
        }
    }

    pub fn toggle(&mut self, direction: Direction) {
        match direction {
            Direction::Incoming => self.incoming = !self.incoming,
            Direction::Outgoing => self.outgoing = !self.outgoing,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.incoming && !self.outgoing
    }

    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|d| self.contains(*d))
    }
}

impl Default for DirectionSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = Self::none();
        for d in iter {
            set.insert(d);
        }
        set
    }
}

impl fmt::Display for DirectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(none)");
        }
        let names: Vec<&str> = self.iter().map(|d| d.as_str()).collect();
        f.write_str(&names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_set_display_and_toggle() {
        let mut set = DirectionSet::all();
        assert_eq!(set.to_string(), "incoming, outgoing");
        set.toggle(Direction::Incoming);
        assert_eq!(set.to_string(), "outgoing");
        set.toggle(Direction::Outgoing);
        assert!(set.is_empty());
        assert_eq!(set.to_string(), "(none)");
    }

    #[test]
    fn test_date_range_inclusive() {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        let range = DateRange::new(Some(d(1, 1)), Some(d(12, 31)));
        assert!(range.contains_date(d(1, 1)));
        assert!(range.contains_date(d(12, 31)));
        assert!(!range.contains_date(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
        assert!(DateRange::unbounded().contains_date(d(6, 15)));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("Incoming".parse::<Direction>().unwrap(), Direction::Incoming);
        assert_eq!(" outgoing".parse::<Direction>().unwrap(), Direction::Outgoing);
        assert!("sideways".parse::<Direction>().is_err());
    }
}
