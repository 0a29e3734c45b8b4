//! Bucketing events for the day, week and month views.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;

use crate::date_range::DateRange;
use crate::event::Event;

/// Events keyed by local start date, each bucket sorted by start time.
///
/// Days of `range` without events are present with an empty bucket so views
/// can render gaps.
pub fn group_by_day<'a>(
    events: impl IntoIterator<Item = &'a Event>,
    range: DateRange,
    tz: Tz,
) -> BTreeMap<NaiveDate, Vec<&'a Event>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<&'a Event>> =
        range.days().map(|day| (day, Vec::new())).collect();

    for event in events {
        let day = event.local_date(tz);
        if range.contains(day) {
            buckets.entry(day).or_default().push(event);
        }
    }

    for bucket in buckets.values_mut() {
        bucket.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.technician.cmp(&b.technician)));
    }

    buckets
}

/// Events keyed by technician name, each bucket sorted by start time.
pub fn group_by_technician<'a>(
    events: impl IntoIterator<Item = &'a Event>,
) -> BTreeMap<&'a str, Vec<&'a Event>> {
    let mut buckets: BTreeMap<&'a str, Vec<&'a Event>> = BTreeMap::new();
    for event in events {
        buckets.entry(event.technician.as_str()).or_default().push(event);
    }
    for bucket in buckets.values_mut() {
        bucket.sort_by_key(|e| e.start);
    }
    buckets
}

/// A month laid out as Monday-first weeks. Cells outside the month are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<[Option<NaiveDate>; 7]>,
}

impl MonthGrid {
    pub fn for_date(date: NaiveDate) -> Self {
        let range = DateRange::month_of(date);
        let mut weeks = Vec::new();
        let mut week: [Option<NaiveDate>; 7] = [None; 7];

        for day in range.days() {
            let column = day.weekday().num_days_from_monday() as usize;
            week[column] = Some(day);
            if column == 6 {
                weeks.push(week);
                week = [None; 7];
            }
        }
        if week.iter().any(Option::is_some) {
            weeks.push(week);
        }

        MonthGrid {
            year: range.from.year(),
            month: range.from.month(),
            weeks,
        }
    }

    pub fn range(&self) -> DateRange {
        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default();
        DateRange::month_of(first)
    }
}
