use anyhow::Result;

use super::types::{DateRange, MailEvent};

/// Anything that can produce mail events for a date range.
///
/// Implementations tag the direction, drop timezone info and skip undated
/// items before handing events over. Order of the returned events is not
/// significant.
pub trait MailSource {
    fn fetch(&self, range: &DateRange) -> Result<Vec<MailEvent>>;
}

/// In-memory events, mostly useful for tests and replaying exports
impl MailSource for Vec<MailEvent> {
    fn fetch(&self, range: &DateRange) -> Result<Vec<MailEvent>> {
        Ok(self
            .iter()
            .filter(|e| range.contains(&e.timestamp))
            .copied()
            .collect())
    }
}
