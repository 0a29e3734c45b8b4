//! EspoCRM provider for fieldops.
//!
//! Reads appointment records of every category from the EspoCRM REST API and
//! maps them into `fieldops_core::Event`s.

pub mod aggregate;
pub mod client;
pub mod error;
pub mod mapping;

pub use aggregate::{Aggregator, FetchResult, SourceFailure};
pub use client::{EspoClient, Record};
pub use error::{EspoError, EspoResult};
pub use mapping::RecordMapping;
