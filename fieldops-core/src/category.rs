//! Appointment categories.
//!
//! Every category is backed by one EspoCRM entity type. The entity names are
//! configurable (see `config::RecordTypes`); the defaults live here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FieldOpsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Autopsy,
    Construction,
    Splicing,
    Earthwork,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Autopsy,
        Category::Construction,
        Category::Splicing,
        Category::Earthwork,
    ];

    /// Upper-case code, as used in filters and JSON output
    pub fn code(&self) -> &'static str {
        match self {
            Category::Autopsy => "AUTOPSY",
            Category::Construction => "CONSTRUCTION",
            Category::Splicing => "SPLICING",
            Category::Earthwork => "EARTHWORK",
        }
    }

    /// Default EspoCRM entity type holding this category's records
    pub fn default_entity(&self) -> &'static str {
        match self {
            Category::Autopsy => "Autopsy",
            Category::Construction => "Construction",
            Category::Splicing => "Splicing",
            Category::Earthwork => "Earthwork",
        }
    }

    /// Single character drawn inside timeline bars
    pub fn glyph(&self) -> char {
        match self {
            Category::Autopsy => 'A',
            Category::Construction => 'C',
            Category::Splicing => 'S',
            Category::Earthwork => 'E',
        }
    }

    /// Human-readable label, also the fallback title for untitled records
    pub fn label(&self) -> &'static str {
        match self {
            Category::Autopsy => "Autopsy",
            Category::Construction => "Construction",
            Category::Splicing => "Splicing",
            Category::Earthwork => "Earthwork",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Category {
    type Err = FieldOpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "autopsy" | "autopsies" => Ok(Category::Autopsy),
            "construction" | "constructions" => Ok(Category::Construction),
            "splicing" | "splicings" => Ok(Category::Splicing),
            "earthwork" | "earthworks" => Ok(Category::Earthwork),
            _ => Err(FieldOpsError::UnknownCategory(s.to_string())),
        }
    }
}
