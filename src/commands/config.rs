use anyhow::Result;
use clap::Subcommand;
use fieldops_core::config::{DisplayPrefs, FieldOpsConfig, Session};
use fieldops_core::{Category, EventStatus};
use owo_colors::OwoColorize;

use crate::render::Render;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Paths of the config files (default)
    Path,
    /// Effective settings after environment overrides
    Show,
    /// Show or change display preferences
    Display {
        #[command(subcommand)]
        action: Option<DisplayAction>,
    },
}

#[derive(Subcommand)]
pub enum DisplayAction {
    /// Hide a category in every view
    Hide { category: Category },
    /// Show a hidden category again
    Show { category: Category },
    /// Hide a status code in every view
    HideStatus { code: String },
    /// Show a hidden status code again
    ShowStatus { code: String },
    /// Events per day above which the week view shows counts
    Compact { threshold: usize },
    /// Restore defaults
    Reset,
}

pub fn run(command: Option<ConfigCommand>) -> Result<()> {
    match command.unwrap_or(ConfigCommand::Path) {
        ConfigCommand::Path => paths(),
        ConfigCommand::Show => show(),
        ConfigCommand::Display { action } => display(action),
    }
}

fn paths() -> Result<()> {
    println!("{}", "Paths".bold());
    println!("  Config:   {}", FieldOpsConfig::config_path()?.display());
    println!("  Session:  {}", Session::path()?.display());
    println!("  Display:  {}", DisplayPrefs::path()?.display());
    Ok(())
}

fn show() -> Result<()> {
    let config = FieldOpsConfig::load()?;
    let session = Session::load()?;
    let unset = || "(not set)".dimmed().to_string();

    println!("{}", "Server".bold());
    println!(
        "  Base URL:   {}",
        config.base_url.clone().unwrap_or_else(unset)
    );
    println!(
        "  Token:      {}",
        match session.token() {
            Ok(token) => mask(token),
            Err(_) => unset(),
        }
    );
    println!(
        "  User:       {}",
        session.display_name().map(str::to_string).unwrap_or_else(unset)
    );

    println!();
    println!("{}", "Views".bold());
    println!("  Timezone:   {}", config.timezone()?);
    let window = config.window();
    println!(
        "  Window:     {:02}:00–{:02}:00",
        window.start_hour, window.end_hour
    );
    println!("  Lane cap:   {}", config.lane_cap);
    println!(
        "  Duration:   {} min when a record has no end",
        config.default_duration().num_minutes()
    );

    println!();
    println!("{}", "Requests".bold());
    println!("  Timeout:    {}", config.request_timeout.as_str());
    println!("  Debounce:   {}", config.debounce.as_str());

    println!();
    println!("{}", "Record types".bold());
    for category in Category::ALL {
        println!(
            "  {} {:<13} {}",
            category.render(),
            category.label(),
            config.record_types.entity_for(category)
        );
    }

    Ok(())
}

fn display(action: Option<DisplayAction>) -> Result<()> {
    let mut prefs = DisplayPrefs::load()?;

    if let Some(action) = action {
        apply(&mut prefs, action);
        prefs.save()?;
        tracing::debug!(?prefs, "saved display preferences");
    }

    print_prefs(&prefs);
    Ok(())
}

fn apply(prefs: &mut DisplayPrefs, action: DisplayAction) {
    match action {
        DisplayAction::Hide { category } => {
            if !prefs.hidden_categories.contains(&category) {
                prefs.hidden_categories.push(category);
                prefs.hidden_categories.sort();
            }
        }
        DisplayAction::Show { category } => prefs.hidden_categories.retain(|c| *c != category),
        DisplayAction::HideStatus { code } => {
            let code = EventStatus::parse(&code).code().to_string();
            if !prefs.hidden_statuses.contains(&code) {
                prefs.hidden_statuses.push(code);
            }
        }
        DisplayAction::ShowStatus { code } => {
            let status = EventStatus::parse(&code);
            prefs
                .hidden_statuses
                .retain(|s| EventStatus::parse(s) != status);
        }
        DisplayAction::Compact { threshold } => prefs.compact_threshold = threshold,
        DisplayAction::Reset => *prefs = DisplayPrefs::default(),
    }
}

fn print_prefs(prefs: &DisplayPrefs) {
    println!("{}", "Display".bold());
    let categories: Vec<String> = prefs.hidden_categories.iter().map(|c| c.render()).collect();
    let statuses: Vec<String> = prefs
        .hidden_statuses
        .iter()
        .map(|s| EventStatus::parse(s).render())
        .collect();
    println!("  Hidden categories:  {}", list_or_none(&categories));
    println!("  Hidden statuses:    {}", list_or_none(&statuses));
    println!("  Compact above:      {} per day", prefs.compact_threshold);
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".dimmed().to_string()
    } else {
        items.join(" ")
    }
}

/// Keep only the last four characters of a secret
fn mask(token: &str) -> String {
    let count = token.chars().count();
    let tail: String = token.chars().skip(count.saturating_sub(4)).collect();
    format!("{}{tail}", "*".repeat(count.saturating_sub(4).min(8)))
}
