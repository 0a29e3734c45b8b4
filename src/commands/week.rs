use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;
use fieldops_core::Event;
use fieldops_core::date_range::DateRange;
use fieldops_core::filter::CategoryCounts;
use fieldops_core::format;
use fieldops_core::grouping::group_by_day;
use fieldops_provider_espocrm::SourceFailure;
use owo_colors::OwoColorize;
use serde::Serialize;

use super::{fetch, print_json, report_failures};
use crate::context::Context;
use crate::filters::FilterArgs;
use crate::render::{Render, event_line};

#[derive(Serialize)]
struct WeekView<'a> {
    from: NaiveDate,
    to: NaiveDate,
    days: BTreeMap<NaiveDate, Vec<&'a Event>>,
    failures: &'a [SourceFailure],
}

pub async fn run(ctx: &Context, date: NaiveDate, args: &FilterArgs) -> Result<()> {
    let range = DateRange::week_of(date);
    let filter = args.to_filter(&ctx.prefs);
    let result = fetch(ctx, range).await?;
    let days = group_by_day(filter.apply(&result.events), range, ctx.tz);

    if args.json {
        return print_json(&WeekView {
            from: range.from,
            to: range.to,
            days,
            failures: &result.failures,
        });
    }

    report_failures(&result);
    let title = format!(
        "{} – {}",
        format::short_date(range.from),
        format::short_date(range.to)
    );
    println!("{}", title.bold());

    for (day, events) in &days {
        println!();
        let heading = format!("{} ({})", format::day_column(*day), events.len());
        if *day == ctx.today {
            println!(
                "{} {}",
                heading.bold().underline(),
                format::relative_day(*day, ctx.today).dimmed()
            );
        } else {
            println!("{}", heading.bold());
        }

        if events.is_empty() {
            println!("  {}", "—".dimmed());
        } else if events.len() > ctx.prefs.compact_threshold {
            // Compact view: counts per category
            println!("  {}", CategoryCounts::count(events.iter().copied()).render());
        } else {
            for event in events {
                println!("  {} {}", event_line(event, ctx.tz), event.technician.dimmed());
            }
        }
    }

    Ok(())
}
