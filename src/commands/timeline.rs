use anyhow::Result;
use chrono::NaiveDate;
use fieldops_core::Event;
use fieldops_core::date_range::DateRange;
use fieldops_core::filter::{CategoryCounts, EventFilter};
use fieldops_core::format;
use fieldops_core::timeline::{DayTimeline, TimelineWindow};
use fieldops_provider_espocrm::{FetchResult, SourceFailure};
use owo_colors::OwoColorize;
use serde::Serialize;

use super::{fetch, print_json, report_failures};
use crate::context::Context;
use crate::filters::FilterArgs;
use crate::render::{Render, timeline_grid};

/// Time axis columns per hour when no width is given
const COLUMNS_PER_HOUR: usize = 4;

#[derive(Serialize)]
struct TimelineView<'a> {
    timeline: DayTimeline<'a>,
    failures: &'a [SourceFailure],
}

pub async fn run(
    ctx: &Context,
    date: NaiveDate,
    width: Option<usize>,
    args: &FilterArgs,
) -> Result<()> {
    let filter = args.to_filter(&ctx.prefs);
    let result = fetch(ctx, DateRange::day(date)).await?;
    let visible: Vec<Event> = filter.apply(&result.events).into_iter().cloned().collect();
    let window = ctx.config.window();
    let timeline = DayTimeline::build(&visible, date, ctx.tz, window, ctx.config.lane_cap);

    if args.json {
        return print_json(&TimelineView {
            timeline,
            failures: &result.failures,
        });
    }

    report_failures(&result);
    print_timeline(&timeline, width.unwrap_or_else(|| default_width(window)), ctx.today);
    print_legend(&result, &filter);

    Ok(())
}

pub fn default_width(window: TimelineWindow) -> usize {
    window.hours() as usize * COLUMNS_PER_HOUR
}

/// Heading, grid and a note for appointments outside the window
pub fn print_timeline(timeline: &DayTimeline, width: usize, today: NaiveDate) {
    println!(
        "{} {}",
        format::day_heading(timeline.date).bold(),
        format!(
            "{:02}:00–{:02}:00",
            timeline.window.start_hour, timeline.window.end_hour
        )
        .dimmed()
    );
    if timeline.date == today {
        println!("{}", format::relative_day(timeline.date, today).dimmed());
    }
    println!();

    if timeline.rows.is_empty() {
        println!("{}", "No appointments".dimmed());
    } else {
        println!("{}", timeline_grid(timeline, width));
    }

    if timeline.excluded > 0 {
        println!();
        println!(
            "{}",
            format!("{} outside the visible hours", timeline.excluded).dimmed()
        );
    }
}

/// Category counts of the fetched day, hidden categories marked
pub fn print_legend(result: &FetchResult, filter: &EventFilter) {
    let counts = CategoryCounts::count(&result.events);
    let entries: Vec<String> = counts
        .iter()
        .map(|(category, n)| {
            let entry = format!("{} {} {}", category.render(), category.label(), n);
            if filter.is_visible(category) {
                entry
            } else {
                format!("{}", entry.strikethrough().dimmed())
            }
        })
        .collect();
    println!();
    println!("{}", entries.join("  "));
}
