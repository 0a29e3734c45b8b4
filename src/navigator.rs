//! State of the interactive `watch` view: the shown date, the debounce timer
//! and the generation guard that drops superseded responses.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{Days, NaiveDate};
use fieldops_core::Category;
use fieldops_core::date_range::parse_day;
use tokio::time::Instant;

/// One line of input in the watch view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavCommand {
    Next,
    Previous,
    Today,
    Goto(NaiveDate),
    /// Show or hide a category without refetching
    Toggle(Category),
    Retry,
    Quit,
}

impl NavCommand {
    pub fn parse(input: &str, today: NaiveDate) -> Option<Self> {
        let input = input.trim();
        match input {
            "n" => Some(NavCommand::Next),
            "p" => Some(NavCommand::Previous),
            "t" => Some(NavCommand::Today),
            "r" => Some(NavCommand::Retry),
            "q" => Some(NavCommand::Quit),
            _ => {
                if let Some(rest) = input.strip_prefix("h ") {
                    return rest.trim().parse().ok().map(NavCommand::Toggle);
                }
                parse_day(input, today).ok().map(NavCommand::Goto)
            }
        }
    }
}

/// Shown date of the watch view
#[derive(Debug, Clone, Copy)]
pub struct Navigator {
    date: NaiveDate,
    today: NaiveDate,
}

impl Navigator {
    pub fn new(date: NaiveDate, today: NaiveDate) -> Self {
        Navigator { date, today }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Apply a navigation command. Returns true when the date changed.
    pub fn apply(&mut self, command: &NavCommand) -> bool {
        let next = match command {
            NavCommand::Next => self.date.checked_add_days(Days::new(1)),
            NavCommand::Previous => self.date.checked_sub_days(Days::new(1)),
            NavCommand::Today => Some(self.today),
            NavCommand::Goto(date) => Some(*date),
            _ => None,
        };

        match next {
            Some(date) if date != self.date => {
                self.date = date;
                true
            }
            _ => false,
        }
    }
}

/// A delay restarted by every trigger; fires once after the last one
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Debounce {
            delay,
            deadline: None,
        }
    }

    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Fire on the next poll, skipping the delay
    pub fn trigger_now(&mut self, now: Instant) {
        self.deadline = Some(now);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Clear the timer once it has fired
    pub fn take(&mut self) -> Option<Instant> {
        self.deadline.take()
    }
}

/// Numbers fetches; only the newest one may be applied
#[derive(Debug, Clone, Default)]
pub struct LatestOnly {
    latest: Arc<AtomicU64>,
}

impl LatestOnly {
    /// Start a new generation, superseding all earlier ones
    pub fn next(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == generation
    }
}
