//! Category, technician and status filters for the views.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::category::Category;
use crate::event::Event;
use crate::status::EventStatus;

/// Which events a view shows. The default shows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    hidden_categories: BTreeSet<Category>,
    hidden_statuses: BTreeSet<EventStatus>,
    /// Case-insensitive substring of the technician name
    technician: Option<String>,
    /// When set, only these statuses are shown
    statuses: Option<BTreeSet<EventStatus>>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a category between shown and hidden. Returns the new visibility.
    pub fn toggle(&mut self, category: Category) -> bool {
        if !self.hidden_categories.remove(&category) {
            self.hidden_categories.insert(category);
            false
        } else {
            true
        }
    }

    pub fn hide(&mut self, category: Category) {
        self.hidden_categories.insert(category);
    }

    pub fn show(&mut self, category: Category) {
        self.hidden_categories.remove(&category);
    }

    /// Hide every category except `category`
    pub fn only(&mut self, category: Category) {
        self.hidden_categories = Category::ALL
            .into_iter()
            .filter(|c| *c != category)
            .collect();
    }

    pub fn is_visible(&self, category: Category) -> bool {
        !self.hidden_categories.contains(&category)
    }

    pub fn hide_status(&mut self, status: EventStatus) {
        self.hidden_statuses.insert(status);
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.statuses.get_or_insert_with(BTreeSet::new).insert(status);
        self
    }

    pub fn with_technician(mut self, name: impl Into<String>) -> Self {
        self.technician = Some(name.into().to_lowercase());
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        if !self.is_visible(event.category) || self.hidden_statuses.contains(&event.status) {
            return false;
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&event.status) {
                return false;
            }
        }
        match &self.technician {
            Some(needle) => event.technician.to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }

    pub fn apply<'a>(&self, events: &'a [Event]) -> Vec<&'a Event> {
        events.iter().filter(|e| self.matches(e)).collect()
    }
}

/// Number of events per category. Every category is present, possibly zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCounts(BTreeMap<Category, usize>);

impl CategoryCounts {
    pub fn count<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        let mut counts: BTreeMap<Category, usize> =
            Category::ALL.into_iter().map(|c| (c, 0)).collect();
        for event in events {
            *counts.entry(event.category).or_default() += 1;
        }
        CategoryCounts(counts)
    }

    pub fn get(&self, category: Category) -> usize {
        self.0.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        self.0.iter().map(|(c, n)| (*c, *n))
    }
}
