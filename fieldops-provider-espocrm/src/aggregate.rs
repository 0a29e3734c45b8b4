//! Fetching every record type for a date and merging them into one list.
//!
//! Record types are requested concurrently. A failed type contributes no
//! events and is reported in `failures`; the others are still returned.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use fieldops_core::Category;
use fieldops_core::Event;
use fieldops_core::config::FieldOpsConfig;
use fieldops_core::constants::{DEFAULT_MAX_SIZE, RANGE_FETCH_CONCURRENCY};
use fieldops_core::date_range::DateRange;
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::client::{EspoClient, Record};
use crate::error::{EspoError, EspoResult};
use crate::mapping::RecordMapping;

/// A record type that could not be loaded
#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub category: Category,
    pub entity: String,
    pub date: NaiveDate,
    pub error: String,
    pub unauthorized: bool,
}

impl SourceFailure {
    fn new(mapping: &RecordMapping, date: NaiveDate, error: &EspoError) -> Self {
        SourceFailure {
            category: mapping.category,
            entity: mapping.entity.clone(),
            date,
            error: error.to_string(),
            unauthorized: error.is_unauthorized(),
        }
    }
}

/// Events for a date range plus the sources that failed
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchResult {
    /// Sorted by start, then technician
    pub events: Vec<Event>,
    pub failures: Vec<SourceFailure>,
}

impl FetchResult {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    fn merge(&mut self, other: FetchResult) {
        self.events.extend(other.events);
        self.failures.extend(other.failures);
    }

    fn sort(&mut self) {
        self.events.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| a.technician.cmp(&b.technician))
                .then_with(|| a.id.cmp(&b.id))
        });
        self.failures
            .sort_by(|a, b| a.date.cmp(&b.date).then(a.category.cmp(&b.category)));
    }
}

#[derive(Clone)]
pub struct Aggregator {
    client: EspoClient,
    mappings: Vec<RecordMapping>,
    default_duration: Duration,
    tz: Tz,
}

impl Aggregator {
    pub fn new(
        client: EspoClient,
        mappings: Vec<RecordMapping>,
        default_duration: Duration,
        tz: Tz,
    ) -> Self {
        Aggregator {
            client,
            mappings,
            default_duration,
            tz,
        }
    }

    /// Build a client and the default mappings from the local configuration
    pub fn from_config(config: &FieldOpsConfig, token: &str) -> EspoResult<Self> {
        let client = EspoClient::new(
            config.base_url()?,
            token,
            config.request_timeout()?,
            DEFAULT_MAX_SIZE,
        )?;
        let mappings = Category::ALL
            .into_iter()
            .map(|c| RecordMapping::for_category(c, config.record_types.entity_for(c)))
            .collect();

        Ok(Aggregator::new(client, mappings, config.default_duration(), config.timezone()?))
    }

    pub fn mapping(&self, category: Category) -> Option<&RecordMapping> {
        self.mappings.iter().find(|m| m.category == category)
    }

    /// One concurrent list request per record type; waits for all to settle
    async fn list_all(&self, date: NaiveDate) -> Vec<(&RecordMapping, EspoResult<Vec<Record>>)> {
        let requests = self.mappings.iter().map(|mapping| async move {
            let result = self
                .client
                .list_on_date(&mapping.entity, mapping.date_field, date, self.tz)
                .await;
            if let Err(e) = &result {
                tracing::warn!(entity = %mapping.entity, %date, error = %e, "record type failed");
            }
            (mapping, result)
        });

        futures::future::join_all(requests).await
    }

    /// All events starting on `date` in the display timezone, one request per
    /// record type
    pub async fn fetch_day(&self, date: NaiveDate) -> FetchResult {
        let mut fetched = FetchResult::default();
        for (mapping, result) in self.list_all(date).await {
            match result {
                Ok(records) => {
                    let before = fetched.events.len();
                    for event in records
                        .iter()
                        .filter_map(|r| mapping.map_record(r, self.default_duration, self.tz))
                    {
                        if event.local_date(self.tz) == date {
                            fetched.events.push(event);
                        } else {
                            tracing::debug!(
                                entity = %mapping.entity,
                                id = %event.id,
                                %date,
                                local_date = %event.local_date(self.tz),
                                "dropping record from another local day"
                            );
                        }
                    }
                    tracing::debug!(
                        entity = %mapping.entity,
                        %date,
                        records = records.len(),
                        events = fetched.events.len() - before,
                        "fetched record type"
                    );
                }
                Err(e) => fetched.failures.push(SourceFailure::new(mapping, date, &e)),
            }
        }

        fetched.sort();
        fetched
    }

    /// Every day of `range`, a few days in flight at a time
    pub async fn fetch_range(&self, range: DateRange) -> FetchResult {
        let mut days = stream::iter(range.days())
            .map(|date| self.fetch_day(date))
            .buffer_unordered(RANGE_FETCH_CONCURRENCY);

        let mut fetched = FetchResult::default();
        while let Some(day) = days.next().await {
            fetched.merge(day);
        }

        fetched.sort();
        fetched
    }

    /// Raw records per category for `date`, for validation
    pub async fn fetch_raw_day(
        &self,
        date: NaiveDate,
    ) -> (BTreeMap<Category, Vec<Record>>, Vec<SourceFailure>) {
        let mut records = BTreeMap::new();
        let mut failures = Vec::new();
        for (mapping, result) in self.list_all(date).await {
            match result {
                Ok(list) => {
                    records.insert(mapping.category, list);
                }
                Err(e) => failures.push(SourceFailure::new(mapping, date, &e)),
            }
        }

        (records, failures)
    }

    /// One raw record of `category`
    pub async fn fetch_record(&self, category: Category, id: &str) -> EspoResult<Record> {
        let entity = self
            .mapping(category)
            .map(|m| m.entity.as_str())
            .unwrap_or(category.default_entity());
        self.client.get_record(entity, id).await
    }
}
