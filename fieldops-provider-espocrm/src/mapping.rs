//! Mapping raw EspoCRM records into `Event`s.
//!
//! Each record type names its fields differently, so every `Event` field is
//! read through a fallback chain: the first attribute that is present and
//! non-empty wins, otherwise a default applies.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use fieldops_core::constants::UNASSIGNED_TECHNICIAN;
use fieldops_core::{Category, Event, EventStatus};
use serde_json::Value;

use crate::client::Record;

/// Field lookups for one record type
#[derive(Debug, Clone)]
pub struct RecordMapping {
    pub category: Category,
    /// EspoCRM entity type
    pub entity: String,
    /// Attribute used for the per-date list filter
    pub date_field: &'static str,
    pub title: &'static [&'static str],
    pub start: &'static [&'static str],
    pub end: &'static [&'static str],
    pub technician: &'static [&'static str],
    pub status: &'static [&'static str],
    pub address: &'static [&'static str],
}

const TECHNICIAN: &[&str] = &["assignedUserName", "technicianName", "createdByName"];
const STATUS: &[&str] = &["status", "stage"];

impl RecordMapping {
    pub fn for_category(category: Category, entity: impl Into<String>) -> Self {
        let entity = entity.into();
        match category {
            Category::Autopsy => RecordMapping {
                category,
                entity,
                date_field: "dateStart",
                title: &["name", "sr", "buildingId"],
                start: &["dateStart", "autopsyDate", "dateStartDate"],
                end: &["dateEnd", "dateEndDate"],
                technician: TECHNICIAN,
                status: STATUS,
                address: &["address", "addressStreet", "location"],
            },
            Category::Construction => RecordMapping {
                category,
                entity,
                date_field: "dateStart",
                title: &["name", "sr", "projectName"],
                start: &["dateStart", "constructionDate", "dateStartDate"],
                end: &["dateEnd", "dateCompleted", "dateEndDate"],
                technician: &["assignedUserName", "crewLeaderName", "technicianName"],
                status: STATUS,
                address: &["addressStreet", "address", "location"],
            },
            Category::Splicing => RecordMapping {
                category,
                entity,
                date_field: "dateStart",
                title: &["name", "cabinet", "sr"],
                start: &["dateStart", "splicingDate", "dateStartDate"],
                end: &["dateEnd", "dateEndDate"],
                technician: &["assignedUserName", "splicerName", "technicianName"],
                status: &["status", "splicingStatus", "stage"],
                address: &["addressStreet", "address"],
            },
            Category::Earthwork => RecordMapping {
                category,
                entity,
                date_field: "dateStart",
                title: &["name", "sr", "workOrder"],
                start: &["dateStart", "earthworkDate", "dateStartDate"],
                end: &["dateEnd", "dateEndDate"],
                technician: &["assignedUserName", "contractorName", "technicianName"],
                status: STATUS,
                address: &["addressStreet", "address", "location"],
            },
        }
    }

    /// Map one record. Returns `None` when no start can be read.
    pub fn map_record(&self, record: &Record, default_duration: Duration, tz: Tz) -> Option<Event> {
        let Some(start) = lookup(record, self.start).and_then(|s| parse_espo_datetime(&s, tz))
        else {
            tracing::debug!(
                entity = %self.entity,
                id = ?record.get("id"),
                "skipping record without a start"
            );
            return None;
        };

        let end = lookup(record, self.end)
            .and_then(|s| parse_espo_datetime(&s, tz))
            .unwrap_or(start + default_duration);

        Some(Event {
            id: lookup(record, &["id"]).unwrap_or_default(),
            title: lookup(record, self.title).unwrap_or_else(|| self.category.label().to_string()),
            start,
            end,
            category: self.category,
            technician: lookup(record, self.technician)
                .unwrap_or_else(|| UNASSIGNED_TECHNICIAN.to_string()),
            status: lookup(record, self.status)
                .map(|s| EventStatus::parse(&s))
                .unwrap_or(EventStatus::New),
            address: lookup(record, self.address),
            record_type: self.entity.clone(),
        })
    }
}

/// First present, non-empty attribute of `chain`, as a string
pub fn lookup(record: &Record, chain: &[&str]) -> Option<String> {
    chain.iter().find_map(|field| match record.get(*field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Parse an EspoCRM date/time.
///
/// Datetimes (`YYYY-MM-DD HH:MM[:SS]`) are UTC. RFC 3339 is accepted too.
/// A bare `YYYY-MM-DD` is local midnight in `tz`.
pub fn parse_espo_datetime(s: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
