pub mod check;
pub mod config;
pub mod day;
pub mod month;
pub mod timeline;
pub mod watch;
pub mod week;

use anyhow::Result;
use fieldops_core::date_range::DateRange;
use fieldops_provider_espocrm::FetchResult;
use serde::Serialize;

use crate::context::Context;
use crate::render::failure_banner;
use crate::utils::tui::with_spinner;

/// Fetch every record type for `range` behind a spinner
pub async fn fetch(ctx: &Context, range: DateRange) -> Result<FetchResult> {
    let aggregator = ctx.aggregator()?;
    let message = if range.len_days() == 1 {
        "Φόρτωση ραντεβού…".to_string()
    } else {
        format!("Φόρτωση ραντεβού ({} ημέρες)…", range.len_days())
    };

    let result = with_spinner(message, aggregator.fetch_range(range)).await;
    tracing::debug!(
        events = result.events.len(),
        failures = result.failures.len(),
        "fetch finished"
    );
    Ok(result)
}

/// Print the error banner to stderr when some sources failed
pub fn report_failures(result: &FetchResult) {
    if let Some(banner) = failure_banner(&result.failures) {
        eprintln!("{banner}\n");
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
