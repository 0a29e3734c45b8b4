//! The unified appointment model.
//!
//! Every EspoCRM record type is mapped into this one shape by the provider.
//! Views work exclusively with it.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::status::EventStatus;

/// A technician appointment (record-type neutral)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub category: Category,
    /// Assigned resource name
    pub technician: String,
    pub status: EventStatus,
    pub address: Option<String>,
    /// EspoCRM entity type the record came from
    pub record_type: String,
}

impl Event {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Events with `end <= start` are never laid out
    pub fn has_positive_duration(&self) -> bool {
        self.end > self.start
    }

    /// Calendar day of the start, in the display timezone
    pub fn local_date(&self, tz: Tz) -> NaiveDate {
        self.start.with_timezone(&tz).date_naive()
    }

    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start < to && self.end > from
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::TimeZone;

    /// Build an event on 2025-03-20 from UTC hour/minute pairs
    pub fn event_at(id: &str, technician: &str, start: (u32, u32), end: (u32, u32)) -> Event {
        Event {
            id: id.to_string(),
            title: format!("Job {id}"),
            start: Utc.with_ymd_and_hms(2025, 3, 20, start.0, start.1, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 3, 20, end.0, end.1, 0).unwrap(),
            category: Category::Construction,
            technician: technician.to_string(),
            status: EventStatus::Scheduled,
            address: None,
            record_type: "Construction".to_string(),
        }
    }
}
