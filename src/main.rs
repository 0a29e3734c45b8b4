mod commands;
mod context;
mod filters;
mod navigator;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fieldops_core::Category;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::context::Context;
use crate::filters::FilterArgs;

#[derive(Parser)]
#[command(name = "fieldops")]
#[command(about = "Calendar and timeline views of field technician appointments")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Appointments of one day, grouped by technician
    Day {
        /// today, tomorrow, yesterday, YYYY-MM-DD or DD/MM/YYYY
        date: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// The week (Monday to Sunday) containing DATE
    Week {
        date: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Month grid with appointment counts per day
    Month {
        date: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Per-technician lane timeline of one day
    Timeline {
        date: Option<String>,

        /// Columns of the time axis (default: 4 per hour)
        #[arg(long)]
        width: Option<usize>,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Interactive timeline: n/p/t to move, a date to jump, r to retry, q to quit
    Watch {
        date: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Report records with missing required fields
    Check {
        /// Check every record starting on this date
        date: Option<String>,

        /// Record type of --id
        #[arg(short, long, requires = "id")]
        category: Option<Category>,

        /// Check a single record
        #[arg(long, requires = "category", conflicts_with = "date")]
        id: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show paths and settings, or edit display preferences
    Config {
        #[command(subcommand)]
        command: Option<commands::config::ConfigCommand>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Day { date, filters } => {
            let ctx = Context::load()?;
            let date = ctx.parse_date(date.as_deref())?;
            commands::day::run(&ctx, date, &filters).await
        }
        Commands::Week { date, filters } => {
            let ctx = Context::load()?;
            let date = ctx.parse_date(date.as_deref())?;
            commands::week::run(&ctx, date, &filters).await
        }
        Commands::Month { date, filters } => {
            let ctx = Context::load()?;
            let date = ctx.parse_date(date.as_deref())?;
            commands::month::run(&ctx, date, &filters).await
        }
        Commands::Timeline {
            date,
            width,
            filters,
        } => {
            let ctx = Context::load()?;
            let date = ctx.parse_date(date.as_deref())?;
            commands::timeline::run(&ctx, date, width, &filters).await
        }
        Commands::Watch { date, filters } => {
            let ctx = Context::load()?;
            let date = ctx.parse_date(date.as_deref())?;
            commands::watch::run(ctx, date, &filters).await
        }
        Commands::Check {
            date,
            category,
            id,
            json,
        } => {
            let ctx = Context::load()?;
            match (category, id) {
                (Some(category), Some(id)) => {
                    commands::check::run_record(&ctx, category, &id, json).await
                }
                _ => {
                    let date = ctx.parse_date(date.as_deref())?;
                    commands::check::run_day(&ctx, date, json).await
                }
            }
        }
        Commands::Config { command } => commands::config::run(command),
    }
}

/// `FIELDOPS_LOG` takes an `EnvFilter` directive; `-v` raises the default to debug.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "fieldops=debug,fieldops_core=debug,fieldops_provider_espocrm=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("FIELDOPS_LOG").unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
