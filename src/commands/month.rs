use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use fieldops_core::filter::CategoryCounts;
use fieldops_core::format;
use fieldops_core::grouping::{MonthGrid, group_by_day};
use fieldops_provider_espocrm::SourceFailure;
use owo_colors::OwoColorize;
use serde::Serialize;

use super::{fetch, print_json, report_failures};
use crate::context::Context;
use crate::filters::FilterArgs;
use crate::render::Render;

/// Width of one day cell, e.g. " 20·12 "
const CELL_WIDTH: usize = 7;

#[derive(Serialize)]
struct MonthView<'a> {
    year: i32,
    month: u32,
    /// Visible appointments per day
    days: BTreeMap<NaiveDate, usize>,
    counts: CategoryCounts,
    failures: &'a [SourceFailure],
}

pub async fn run(ctx: &Context, date: NaiveDate, args: &FilterArgs) -> Result<()> {
    let grid = MonthGrid::for_date(date);
    let range = grid.range();
    let filter = args.to_filter(&ctx.prefs);
    let result = fetch(ctx, range).await?;

    let visible = filter.apply(&result.events);
    let counts = CategoryCounts::count(visible.iter().copied());
    let days: BTreeMap<NaiveDate, usize> = group_by_day(visible, range, ctx.tz)
        .into_iter()
        .map(|(day, events)| (day, events.len()))
        .collect();

    if args.json {
        return print_json(&MonthView {
            year: grid.year,
            month: grid.month,
            days,
            counts,
            failures: &result.failures,
        });
    }

    report_failures(&result);
    println!("{}", format::month_title(date).bold());
    println!();
    println!(
        "{}",
        format::weekday_header()
            .iter()
            .map(|name| format!("{name:^CELL_WIDTH$}"))
            .collect::<String>()
            .dimmed()
    );

    for week in &grid.weeks {
        let line: String = week
            .iter()
            .map(|cell| match cell {
                Some(day) => day_cell(*day, days.get(day).copied().unwrap_or(0), ctx.today),
                None => " ".repeat(CELL_WIDTH),
            })
            .collect();
        println!("{line}");
    }

    println!();
    println!("{}", counts.render());

    Ok(())
}

fn day_cell(day: NaiveDate, count: usize, today: NaiveDate) -> String {
    let number = format!("{:>3}", day.day());
    let number = if day == today {
        number.bold().underline().to_string()
    } else {
        number
    };

    if count == 0 {
        format!("{number}    ")
    } else {
        let badge = format!("·{count}");
        format!("{number}{:<4}", badge.cyan())
    }
}
