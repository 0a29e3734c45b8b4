//! Thin EspoCRM REST client.
//!
//! Only reads: list records of an entity type on a date, and fetch a single
//! record. Responses are kept as raw JSON objects; mapping into events
//! happens in `mapping`.

use std::time::Duration;

use chrono::NaiveDate;
use chrono_tz::Tz;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::{EspoError, EspoResult};

const API_PREFIX: &str = "api/v1/";
const ESPO_AUTHORIZATION: HeaderName = HeaderName::from_static("espo-authorization");

pub type Record = Map<String, Value>;

/// Body of an EspoCRM list response
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    total: i64,
    #[serde(default)]
    list: Vec<Record>,
}

#[derive(Clone)]
pub struct EspoClient {
    http: reqwest::Client,
    api_root: Url,
    timeout: Duration,
    max_size: usize,
}

impl EspoClient {
    /// `token` is the stored base64 `user:password` pair; it is sent both as
    /// Basic auth and as EspoCRM's own header.
    pub fn new(
        base_url: &str,
        token: &str,
        timeout: Duration,
        max_size: usize,
    ) -> EspoResult<Self> {
        let api_root = api_root(base_url)?;

        let mut headers = HeaderMap::new();
        let invalid = |e: reqwest::header::InvalidHeaderValue| EspoError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: format!("token is not a valid header value: {e}"),
        };
        let mut basic = HeaderValue::from_str(&format!("Basic {token}")).map_err(invalid)?;
        basic.set_sensitive(true);
        let mut espo = HeaderValue::from_str(token).map_err(invalid)?;
        espo.set_sensitive(true);
        headers.insert(AUTHORIZATION, basic);
        headers.insert(ESPO_AUTHORIZATION, espo);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| EspoError::Http {
                entity: "client".into(),
                source: e,
            })?;

        Ok(EspoClient {
            http,
            api_root,
            timeout,
            max_size,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Records of `entity` whose `date_field` falls on `date` in `tz`, ordered by it
    pub async fn list_on_date(
        &self,
        entity: &str,
        date_field: &str,
        date: NaiveDate,
        tz: Tz,
    ) -> EspoResult<Vec<Record>> {
        let url = self.entity_url(entity, &[])?;
        let date_str = date.format("%Y-%m-%d").to_string();
        let max_size = self.max_size.to_string();
        let query = [
            ("where[0][type]", "on"),
            ("where[0][attribute]", date_field),
            ("where[0][value]", date_str.as_str()),
            ("where[0][dateTime]", "true"),
            ("where[0][timeZone]", tz.name()),
            ("orderBy", date_field),
            ("order", "asc"),
            ("maxSize", max_size.as_str()),
        ];

        let value = self.get_json(entity, url, &query).await?;
        let response: ListResponse =
            serde_json::from_value(value).map_err(|e| EspoError::Decode {
                entity: entity.to_string(),
                reason: e.to_string(),
            })?;

        if response.total > response.list.len() as i64 {
            tracing::warn!(
                entity,
                total = response.total,
                received = response.list.len(),
                "list truncated by maxSize"
            );
        }

        Ok(response.list)
    }

    /// A single record by id
    pub async fn get_record(&self, entity: &str, id: &str) -> EspoResult<Record> {
        let url = self.entity_url(entity, &[id])?;
        match self.get_json(entity, url, &[]).await? {
            Value::Object(record) => Ok(record),
            other => Err(EspoError::Decode {
                entity: entity.to_string(),
                reason: format!("expected an object, got {other}"),
            }),
        }
    }

    fn entity_url(&self, entity: &str, rest: &[&str]) -> EspoResult<Url> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|_| EspoError::InvalidBaseUrl {
                url: self.api_root.to_string(),
                reason: "cannot be a base".into(),
            })?
            .pop_if_empty()
            .push(entity)
            .extend(rest);
        Ok(url)
    }

    /// The deadline covers the whole exchange, body included
    async fn get_json(&self, entity: &str, url: Url, query: &[(&str, &str)]) -> EspoResult<Value> {
        tracing::debug!(%url, "GET");

        tokio::time::timeout(self.timeout, self.exchange(entity, url, query))
            .await
            .map_err(|_| EspoError::Timeout {
                entity: entity.to_string(),
                secs: self.timeout.as_secs(),
            })?
    }

    async fn exchange(&self, entity: &str, url: Url, query: &[(&str, &str)]) -> EspoResult<Value> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| EspoError::Http {
                entity: entity.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EspoError::Status {
                entity: entity.to_string(),
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        response.json::<Value>().await.map_err(|e| EspoError::Decode {
            entity: entity.to_string(),
            reason: e.to_string(),
        })
    }
}

/// `https://crm.example.gr` -> `https://crm.example.gr/api/v1/`
fn api_root(base_url: &str) -> EspoResult<Url> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let with_slash = format!("{trimmed}/");
    let base = Url::parse(&with_slash).map_err(|e| EspoError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;

    if base.path().ends_with(API_PREFIX) {
        return Ok(base);
    }
    base.join(API_PREFIX).map_err(|e| EspoError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_root_appends_prefix_once() {
        assert_eq!(
            api_root("https://crm.example.gr").unwrap().as_str(),
            "https://crm.example.gr/api/v1/"
        );
        assert_eq!(
            api_root("https://crm.example.gr/espo/").unwrap().as_str(),
            "https://crm.example.gr/espo/api/v1/"
        );
        assert_eq!(
            api_root("https://crm.example.gr/api/v1").unwrap().as_str(),
            "https://crm.example.gr/api/v1/"
        );
    }

    #[test]
    fn rejects_relative_base_url() {
        assert!(matches!(
            api_root("crm.example.gr"),
            Err(EspoError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn entity_urls() {
        let client = EspoClient::new(
            "https://crm.example.gr",
            "dG9rZW4=",
            Duration::from_secs(5),
            200,
        )
        .unwrap();
        assert_eq!(
            client.entity_url("Splicing", &[]).unwrap().as_str(),
            "https://crm.example.gr/api/v1/Splicing"
        );
        assert_eq!(
            client.entity_url("Splicing", &["abc123"]).unwrap().as_str(),
            "https://crm.example.gr/api/v1/Splicing/abc123"
        );
    }

    #[test]
    fn rejects_token_with_newline() {
        let result = EspoClient::new(
            "https://crm.example.gr",
            "bad\ntoken",
            Duration::from_secs(5),
            10,
        );
        assert!(result.is_err());
    }
}
