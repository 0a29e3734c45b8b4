//! Required-field rules for appointment records.
//!
//! Each category has a fixed list of fields that must be filled in before a
//! record counts as complete. Rules are grouped by the edit-form tab they
//! live on so a failed check can point at the first tab to fix.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::category::Category;

/// Edit-form tabs, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Tab {
    General,
    Schedule,
    Technical,
    Location,
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tab::General => "General",
            Tab::Schedule => "Schedule",
            Tab::Technical => "Technical",
            Tab::Location => "Location",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldRule {
    pub field: &'static str,
    pub tab: Tab,
}

const fn rule(field: &'static str, tab: Tab) -> FieldRule {
    FieldRule { field, tab }
}

const AUTOPSY_RULES: &[FieldRule] = &[
    rule("name", Tab::General),
    rule("status", Tab::General),
    rule("assignedUserId", Tab::General),
    rule("dateStart", Tab::Schedule),
    rule("dateEnd", Tab::Schedule),
    rule("floors", Tab::Technical),
    rule("addressStreet", Tab::Location),
    rule("addressCity", Tab::Location),
];

const CONSTRUCTION_RULES: &[FieldRule] = &[
    rule("name", Tab::General),
    rule("status", Tab::General),
    rule("assignedUserId", Tab::General),
    rule("dateStart", Tab::Schedule),
    rule("dateEnd", Tab::Schedule),
    rule("constructionType", Tab::Technical),
    rule("meters", Tab::Technical),
    rule("addressStreet", Tab::Location),
];

const SPLICING_RULES: &[FieldRule] = &[
    rule("name", Tab::General),
    rule("status", Tab::General),
    rule("assignedUserId", Tab::General),
    rule("dateStart", Tab::Schedule),
    rule("cabinet", Tab::Technical),
    rule("fiberCount", Tab::Technical),
    rule("addressStreet", Tab::Location),
];

const EARTHWORK_RULES: &[FieldRule] = &[
    rule("name", Tab::General),
    rule("status", Tab::General),
    rule("assignedUserId", Tab::General),
    rule("dateStart", Tab::Schedule),
    rule("dateEnd", Tab::Schedule),
    rule("trenchLength", Tab::Technical),
    rule("surfaceType", Tab::Technical),
    rule("addressStreet", Tab::Location),
];

pub fn rules_for(category: Category) -> &'static [FieldRule] {
    match category {
        Category::Autopsy => AUTOPSY_RULES,
        Category::Construction => CONSTRUCTION_RULES,
        Category::Splicing => SPLICING_RULES,
        Category::Earthwork => EARTHWORK_RULES,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub category: Category,
    /// Missing fields, in rule order
    pub missing: Vec<FieldRule>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }

    /// Earliest tab (in display order) holding a missing field
    pub fn first_tab(&self) -> Option<Tab> {
        self.missing.iter().map(|r| r.tab).min()
    }

    /// Missing field names on `tab`
    pub fn missing_on(&self, tab: Tab) -> Vec<&'static str> {
        self.missing
            .iter()
            .filter(|r| r.tab == tab)
            .map(|r| r.field)
            .collect()
    }
}

pub fn validate(category: Category, record: &Map<String, Value>) -> ValidationReport {
    let missing = rules_for(category)
        .iter()
        .filter(|rule| !is_present(record.get(rule.field)))
        .copied()
        .collect();

    ValidationReport { category, missing }
}

/// Null, blank strings and empty arrays count as missing
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}
