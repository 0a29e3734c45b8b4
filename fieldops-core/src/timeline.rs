//! Per-technician day timeline.
//!
//! Clips a day's events to the visible hour window, groups them by
//! technician and stacks each technician's appointments into lanes.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::constants::{DEFAULT_WINDOW_END_HOUR, DEFAULT_WINDOW_START_HOUR};
use crate::event::Event;
use crate::lanes::{Span, assign_lanes};

/// Visible hours of a day, in local time. `end_hour` may be 24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for TimelineWindow {
    fn default() -> Self {
        TimelineWindow {
            start_hour: DEFAULT_WINDOW_START_HOUR,
            end_hour: DEFAULT_WINDOW_END_HOUR,
        }
    }
}

impl TimelineWindow {
    /// Falls back to the default window when the hours are out of order or
    /// beyond the day.
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        if start_hour < end_hour && end_hour <= 24 {
            TimelineWindow { start_hour, end_hour }
        } else {
            tracing::warn!(start_hour, end_hour, "invalid timeline window, using default");
            TimelineWindow::default()
        }
    }

    pub fn hours(&self) -> u32 {
        self.end_hour - self.start_hour
    }

    /// UTC bounds of the window on `date` in `tz`
    pub fn bounds(&self, date: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        let start = localize(tz, midnight + Duration::hours(self.start_hour.into()));
        let end = localize(tz, midnight + Duration::hours(self.end_hour.into()));
        (start, end)
    }
}

/// Resolve a local wall-clock time. Ambiguous times take the earlier instant;
/// times inside a DST gap are read as UTC.
fn localize(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// An event placed on the timeline. `start`/`end` are clipped to the window.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineBar<'a> {
    pub event: &'a Event,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub lane: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TechnicianRow<'a> {
    pub technician: String,
    pub bars: Vec<TimelineBar<'a>>,
    pub lane_count: usize,
    pub overflowed: bool,
}

impl<'a> TechnicianRow<'a> {
    /// Bars of one lane, in start order
    pub fn lane(&self, lane: usize) -> impl Iterator<Item = &TimelineBar<'a>> {
        self.bars.iter().filter(move |b| b.lane == lane)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DayTimeline<'a> {
    pub date: NaiveDate,
    pub window: TimelineWindow,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    /// Rows sorted by technician name
    pub rows: Vec<TechnicianRow<'a>>,
    /// Events that were not laid out (outside the window or non-positive)
    pub excluded: usize,
}

impl<'a> DayTimeline<'a> {
    pub fn build(
        events: &'a [Event],
        date: NaiveDate,
        tz: Tz,
        window: TimelineWindow,
        lane_cap: usize,
    ) -> Self {
        let (window_start, window_end) = window.bounds(date, tz);

        let mut by_technician: BTreeMap<&str, Vec<(&'a Event, Span<DateTime<Utc>>)>> =
            BTreeMap::new();
        let mut excluded = 0;

        for event in events {
            if !event.has_positive_duration() || !event.overlaps(window_start, window_end) {
                excluded += 1;
                continue;
            }
            let clipped = Span::new(event.start.max(window_start), event.end.min(window_end));
            by_technician
                .entry(event.technician.as_str())
                .or_default()
                .push((event, clipped));
        }

        let rows = by_technician
            .into_iter()
            .map(|(technician, placed)| {
                let spans: Vec<_> = placed.iter().map(|(_, span)| *span).collect();
                let assignment = assign_lanes(&spans, lane_cap);

                let mut bars: Vec<TimelineBar<'a>> = placed
                    .iter()
                    .zip(&assignment.lanes)
                    .filter_map(|((event, span), lane)| {
                        lane.map(|lane| TimelineBar {
                            event: *event,
                            start: span.start,
                            end: span.end,
                            lane,
                        })
                    })
                    .collect();
                bars.sort_by(|a, b| a.start.cmp(&b.start).then(a.lane.cmp(&b.lane)));

                TechnicianRow {
                    technician: technician.to_string(),
                    bars,
                    lane_count: assignment.lane_count,
                    overflowed: assignment.overflowed,
                }
            })
            .collect();

        tracing::debug!(%date, excluded, "built day timeline");

        DayTimeline {
            date,
            window,
            window_start,
            window_end,
            rows,
            excluded,
        }
    }

    /// Position of `t` inside the window as a fraction in `0.0..=1.0`
    pub fn offset_fraction(&self, t: DateTime<Utc>) -> f64 {
        let total = (self.window_end - self.window_start).num_seconds();
        if total <= 0 {
            return 0.0;
        }
        let offset = (t - self.window_start).num_seconds().clamp(0, total);
        offset as f64 / total as f64
    }

    /// Total lanes across all rows
    pub fn total_lanes(&self) -> usize {
        self.rows.iter().map(|r| r.lane_count).sum()
    }
}
