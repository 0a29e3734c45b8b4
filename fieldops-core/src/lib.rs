//! Core types for fieldops.
//!
//! This crate holds everything that does not talk to the network:
//! - `Event` and its `Category` / `EventStatus` for technician appointments
//! - `lanes` and `timeline` for packing overlapping appointments into rows
//! - `grouping`, `filter` and `format` for the calendar views
//! - `validation` for the per-category required-field rules
//! - `config` for the local configuration, session and display preferences

pub mod category;
pub mod config;
pub mod constants;
pub mod date_range;
pub mod error;
pub mod event;
pub mod filter;
pub mod format;
pub mod grouping;
pub mod lanes;
pub mod status;
pub mod timeline;
pub mod validation;

pub use category::Category;
pub use event::Event;
pub use status::{EventStatus, StatusColor};
