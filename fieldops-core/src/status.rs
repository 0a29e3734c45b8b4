//! Appointment status codes and their display colors.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Display status of an appointment.
///
/// The CRM stores free-form strings; anything outside the known codes is kept
/// as `Unknown` so it can still be shown and filtered.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventStatus {
    New,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    OnHold,
    Unknown(String),
}

/// Color slot for a status. Terminal rendering picks the actual color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Blue,
    Cyan,
    Yellow,
    Green,
    Red,
    Magenta,
    Grey,
}

impl EventStatus {
    pub const KNOWN: [EventStatus; 6] = [
        EventStatus::New,
        EventStatus::Scheduled,
        EventStatus::InProgress,
        EventStatus::Completed,
        EventStatus::Cancelled,
        EventStatus::OnHold,
    ];

    /// Parse a CRM status string. Case and separators are ignored, so
    /// "In Progress", "in_progress" and "IN-PROGRESS" are the same code.
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_uppercase() })
            .collect();

        match normalized.as_str() {
            "NEW" => EventStatus::New,
            "SCHEDULED" | "PLANNED" => EventStatus::Scheduled,
            "IN_PROGRESS" | "STARTED" => EventStatus::InProgress,
            "COMPLETED" | "DONE" | "HELD" => EventStatus::Completed,
            "CANCELLED" | "CANCELED" | "NOT_HELD" => EventStatus::Cancelled,
            "ON_HOLD" | "PENDING" => EventStatus::OnHold,
            _ => EventStatus::Unknown(raw.trim().to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            EventStatus::New => "NEW",
            EventStatus::Scheduled => "SCHEDULED",
            EventStatus::InProgress => "IN_PROGRESS",
            EventStatus::Completed => "COMPLETED",
            EventStatus::Cancelled => "CANCELLED",
            EventStatus::OnHold => "ON_HOLD",
            EventStatus::Unknown(raw) => raw,
        }
    }

    pub fn color(&self) -> StatusColor {
        match self {
            EventStatus::New => StatusColor::Blue,
            EventStatus::Scheduled => StatusColor::Cyan,
            EventStatus::InProgress => StatusColor::Yellow,
            EventStatus::Completed => StatusColor::Green,
            EventStatus::Cancelled => StatusColor::Red,
            EventStatus::OnHold => StatusColor::Magenta,
            EventStatus::Unknown(_) => StatusColor::Grey,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for EventStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for EventStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(EventStatus::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_case() {
        assert_eq!(EventStatus::parse("In Progress"), EventStatus::InProgress);
        assert_eq!(EventStatus::parse("in_progress"), EventStatus::InProgress);
        assert_eq!(EventStatus::parse("IN-PROGRESS"), EventStatus::InProgress);
        assert_eq!(EventStatus::parse("Not Held"), EventStatus::Cancelled);
    }

    #[test]
    fn keeps_unknown_codes() {
        let status = EventStatus::parse(" Waiting Permit ");
        assert_eq!(status, EventStatus::Unknown("Waiting Permit".to_string()));
        assert_eq!(status.code(), "Waiting Permit");
        assert_eq!(status.color(), StatusColor::Grey);
    }

    #[test]
    fn every_known_status_round_trips_through_its_code() {
        for status in EventStatus::KNOWN {
            assert_eq!(EventStatus::parse(status.code()), status);
        }
    }

    #[test]
    fn color_mapping() {
        assert_eq!(EventStatus::Completed.color(), StatusColor::Green);
        assert_eq!(EventStatus::Cancelled.color(), StatusColor::Red);
        assert_eq!(EventStatus::InProgress.color(), StatusColor::Yellow);
    }
}
