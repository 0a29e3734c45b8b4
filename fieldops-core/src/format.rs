//! Greek-locale date and time formatting.

use chrono::{DateTime, Duration, Locale, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

const LOCALE: Locale = Locale::el_GR;

/// Full day heading, e.g. "Πέμπτη 20 Μαρτίου 2025"
pub fn day_heading(date: NaiveDate) -> String {
    at_noon(date).format_localized("%A %-d %B %Y", LOCALE).to_string()
}

/// Short column heading for week and month views, e.g. "Πεμ 20/03"
pub fn day_column(date: NaiveDate) -> String {
    at_noon(date).format_localized("%a %d/%m", LOCALE).to_string()
}

/// Month title, e.g. "Μάρτιος 2025"
pub fn month_title(date: NaiveDate) -> String {
    at_noon(date).format_localized("%B %Y", LOCALE).to_string()
}

/// Abbreviated weekday names, Monday first
pub fn weekday_header() -> Vec<String> {
    // 2025-03-17 is a Monday
    let monday = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap_or_default();
    (0..7)
        .map(|offset| {
            at_noon(monday + Duration::days(offset))
                .format_localized("%a", LOCALE)
                .to_string()
        })
        .collect()
}

/// Numeric Greek date, e.g. "20/03/2025"
pub fn short_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// "Σήμερα", "Αύριο", "Χθες" near `today`, otherwise the full heading
pub fn relative_day(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Σήμερα".to_string(),
        1 => "Αύριο".to_string(),
        -1 => "Χθες".to_string(),
        _ => day_heading(date),
    }
}

/// 24-hour local time, e.g. "09:30"
pub fn time(t: DateTime<Utc>, tz: Tz) -> String {
    t.with_timezone(&tz).format("%H:%M").to_string()
}

/// "09:30–11:00"
pub fn time_range(start: DateTime<Utc>, end: DateTime<Utc>, tz: Tz) -> String {
    format!("{}–{}", time(start, tz), time(end, tz))
}

/// Compact duration, e.g. "45'", "2ω", "1ω 30'"
pub fn duration(d: Duration) -> String {
    let minutes = d.num_minutes().max(0);
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}'"),
        (h, 0) => format!("{h}ω"),
        (h, m) => format!("{h}ω {m}'"),
    }
}

fn at_noon(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap_or_default())
}
