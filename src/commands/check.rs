use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use fieldops_core::Category;
use fieldops_core::format;
use fieldops_core::validation::{ValidationReport, validate};
use fieldops_provider_espocrm::SourceFailure;
use fieldops_provider_espocrm::mapping::lookup;
use owo_colors::OwoColorize;
use serde::Serialize;

use super::print_json;
use crate::context::Context;
use crate::render::{Render, failure_banner};
use crate::utils::tui::with_spinner;

#[derive(Serialize)]
struct CheckedRecord {
    id: String,
    title: String,
    report: ValidationReport,
}

#[derive(Serialize)]
struct DayCheck<'a> {
    date: NaiveDate,
    checked: usize,
    invalid: Vec<CheckedRecord>,
    failures: &'a [SourceFailure],
}

/// Validate every record of every type starting on `date`
pub async fn run_day(ctx: &Context, date: NaiveDate, json: bool) -> Result<()> {
    let aggregator = ctx.aggregator()?;
    let (records, failures) =
        with_spinner("Έλεγχος εγγραφών…", aggregator.fetch_raw_day(date)).await;

    let mut checked = 0;
    let mut invalid = Vec::new();
    for (category, list) in &records {
        for record in list {
            checked += 1;
            let report = validate(*category, record);
            if !report.is_valid() {
                invalid.push(CheckedRecord {
                    id: lookup(record, &["id"]).unwrap_or_default(),
                    title: lookup(record, &["name"])
                        .unwrap_or_else(|| category.label().to_string()),
                    report,
                });
            }
        }
    }

    if json {
        return print_json(&DayCheck {
            date,
            checked,
            invalid,
            failures: &failures,
        });
    }

    if let Some(banner) = failure_banner(&failures) {
        eprintln!("{banner}\n");
    }

    println!("{}", format::day_heading(date).bold());
    if invalid.is_empty() {
        println!("{}", format!("All {checked} records complete").green());
        return Ok(());
    }

    println!(
        "{}",
        format!("{} of {checked} records incomplete", invalid.len()).dimmed()
    );
    println!();
    for record in &invalid {
        println!(
            "{} {} {}",
            record.report.category.render(),
            record.title,
            format!("({})", record.id).dimmed()
        );
        println!("  {}", record.report.render());
    }

    Ok(())
}

/// Validate one record by id
pub async fn run_record(ctx: &Context, category: Category, id: &str, json: bool) -> Result<()> {
    let aggregator = ctx.aggregator()?;
    let record = with_spinner(
        format!("Φόρτωση {id}…"),
        aggregator.fetch_record(category, id),
    )
    .await
    .with_context(|| format!("Could not load {category} record {id}"))?;

    let report = validate(category, &record);

    if json {
        return print_json(&CheckedRecord {
            id: id.to_string(),
            title: lookup(&record, &["name"]).unwrap_or_else(|| category.label().to_string()),
            report,
        });
    }

    println!(
        "{} {} {}",
        category.render(),
        lookup(&record, &["name"]).unwrap_or_default(),
        format!("({id})").dimmed()
    );

    match report.first_tab() {
        None => println!("  {}", "All required fields present".green()),
        Some(first) => {
            println!("  {} {}", "First tab to fix:".bold(), first.to_string().red());
            let mut tabs: Vec<_> = report.missing.iter().map(|r| r.tab).collect();
            tabs.sort();
            tabs.dedup();
            for tab in tabs {
                println!("  {:<10} {}", tab.to_string(), report.missing_on(tab).join(", "));
            }
        }
    }

    Ok(())
}
