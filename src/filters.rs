use clap::Args;
use fieldops_core::config::DisplayPrefs;
use fieldops_core::filter::EventFilter;
use fieldops_core::{Category, EventStatus};

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Hide a category (repeatable)
    #[arg(long, value_name = "CATEGORY")]
    pub hide: Vec<Category>,

    /// Show only this category
    #[arg(long, value_name = "CATEGORY", conflicts_with = "hide")]
    pub only: Option<Category>,

    /// Technician name (case-insensitive substring)
    #[arg(short, long)]
    pub technician: Option<String>,

    /// Show only these status codes (repeatable)
    #[arg(short, long, value_name = "CODE")]
    pub status: Vec<String>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl FilterArgs {
    /// Display preferences first, then the command line on top
    pub fn to_filter(&self, prefs: &DisplayPrefs) -> EventFilter {
        let mut filter = prefs.base_filter();

        if let Some(category) = self.only {
            filter.only(category);
        }
        for category in &self.hide {
            filter.hide(*category);
        }
        for status in &self.status {
            filter = filter.with_status(EventStatus::parse(status));
        }
        if let Some(name) = &self.technician {
            filter = filter.with_technician(name.as_str());
        }

        filter
    }
}
