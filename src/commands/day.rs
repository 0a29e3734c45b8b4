use anyhow::Result;
use chrono::NaiveDate;
use fieldops_core::Event;
use fieldops_core::date_range::DateRange;
use fieldops_core::filter::CategoryCounts;
use fieldops_core::format;
use fieldops_core::grouping::group_by_technician;
use fieldops_provider_espocrm::SourceFailure;
use owo_colors::OwoColorize;
use serde::Serialize;

use super::{fetch, print_json, report_failures};
use crate::context::Context;
use crate::filters::FilterArgs;
use crate::render::{Render, event_line};

#[derive(Serialize)]
struct DayView<'a> {
    date: NaiveDate,
    events: Vec<&'a Event>,
    /// Counts before category filtering
    counts: CategoryCounts,
    failures: &'a [SourceFailure],
}

pub async fn run(ctx: &Context, date: NaiveDate, args: &FilterArgs) -> Result<()> {
    let filter = args.to_filter(&ctx.prefs);
    let result = fetch(ctx, DateRange::day(date)).await?;
    let visible = filter.apply(&result.events);
    let counts = CategoryCounts::count(&result.events);

    if args.json {
        return print_json(&DayView {
            date,
            events: visible,
            counts,
            failures: &result.failures,
        });
    }

    report_failures(&result);

    println!("{}", format::day_heading(date).bold());
    if date == ctx.today {
        println!("{}", format::relative_day(date, ctx.today).dimmed());
    }
    println!();

    if visible.is_empty() {
        println!("{}", "No appointments".dimmed());
    } else {
        let by_technician = group_by_technician(visible.iter().copied());
        for (i, (technician, events)) in by_technician.iter().enumerate() {
            if i > 0 {
                println!();
            }
            println!("{} {}", technician.bold(), format!("({})", events.len()).dimmed());
            for event in events {
                println!("  {}", event_line(event, ctx.tz));
            }
        }
    }

    println!();
    println!("{}", counts.render());

    Ok(())
}
