//! Date ranges for the calendar views and date argument parsing.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::{FieldOpsError, FieldOpsResult};

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn day(date: NaiveDate) -> Self {
        DateRange {
            from: date,
            to: date,
        }
    }

    /// Monday to Sunday around `date`
    pub fn week_of(date: NaiveDate) -> Self {
        let week = date.week(Weekday::Mon);
        DateRange {
            from: week.first_day(),
            to: week.last_day(),
        }
    }

    /// First to last day of the month containing `date`
    pub fn month_of(date: NaiveDate) -> Self {
        let from = date.with_day(1).unwrap_or(date);
        let next_month = if from.month() == 12 {
            NaiveDate::from_ymd_opt(from.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(from.year(), from.month() + 1, 1)
        };
        let to = next_month.map(|d| d - Duration::days(1)).unwrap_or(from);
        DateRange { from, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn len_days(&self) -> usize {
        ((self.to - self.from).num_days() + 1).max(0) as usize
    }

    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        (0..self.len_days()).map(move |offset| self.from + Duration::days(offset as i64))
    }
}

/// Parse a day argument relative to `today`.
///
/// Accepts `today`, `tomorrow`, `yesterday`, `YYYY-MM-DD` and the Greek
/// `DD/MM/YYYY` form.
pub fn parse_day(s: &str, today: NaiveDate) -> FieldOpsResult<NaiveDate> {
    let trimmed = s.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .map_err(|_| FieldOpsError::InvalidDate(s.to_string()))
}
