use std::time::{Duration, Instant};

use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use fieldops_core::date_range::DateRange;
use fieldops_core::{Category, EventStatus};
use fieldops_provider_espocrm::{Aggregator, EspoClient, EspoError, RecordMapping};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "bmlrb3M6c2VjcmV0";

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()
}

fn aggregator(server: &MockServer, timeout: Duration) -> Aggregator {
    aggregator_in(server, timeout, chrono_tz::UTC)
}

fn aggregator_in(server: &MockServer, timeout: Duration, tz: Tz) -> Aggregator {
    let client = EspoClient::new(&server.uri(), TOKEN, timeout, 200).unwrap();
    let mappings = Category::ALL
        .into_iter()
        .map(|c| RecordMapping::for_category(c, c.default_entity()))
        .collect();
    Aggregator::new(client, mappings, chrono::Duration::minutes(60), tz)
}

async fn mock_list(server: &MockServer, entity: &str, list: serde_json::Value) {
    let total = list.as_array().map(|a| a.len()).unwrap_or(0);
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/{entity}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": total,
            "list": list,
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn merges_all_record_types_sorted_by_start() {
    let server = MockServer::start().await;

    mock_list(
        &server,
        "Autopsy",
        json!([{ "id": "a1", "name": "Autopsy Patision", "dateStart": "2025-03-20 10:00:00",
                 "assignedUserName": "Eleni", "status": "Scheduled" }]),
    )
    .await;
    mock_list(
        &server,
        "Construction",
        json!([{ "id": "c1", "name": "Build", "dateStart": "2025-03-20 07:00:00",
                 "dateEnd": "2025-03-20 12:00:00", "assignedUserName": "Nikos" }]),
    )
    .await;
    mock_list(
        &server,
        "Splicing",
        json!([{ "id": "s1", "cabinet": "K-114", "splicingDate": "2025-03-20 08:30:00",
                 "splicerName": "Kostas", "splicingStatus": "Completed" }]),
    )
    .await;
    mock_list(&server, "Earthwork", json!([])).await;

    let result = aggregator(&server, Duration::from_secs(5)).fetch_day(date()).await;

    assert!(!result.is_partial());
    let ids: Vec<_> = result.events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "s1", "a1"]);

    let splice = &result.events[1];
    assert_eq!(splice.title, "K-114");
    assert_eq!(splice.technician, "Kostas");
    assert_eq!(splice.status, EventStatus::Completed);
    assert_eq!(splice.end, Utc.with_ymd_and_hms(2025, 3, 20, 9, 30, 0).unwrap());
}

#[tokio::test]
async fn failed_record_type_contributes_nothing() {
    let server = MockServer::start().await;

    mock_list(
        &server,
        "Autopsy",
        json!([{ "id": "a1", "dateStart": "2025-03-20 10:00:00" }]),
    )
    .await;
    mock_list(
        &server,
        "Splicing",
        json!([{ "id": "s1", "dateStart": "2025-03-20 11:00:00" }]),
    )
    .await;
    mock_list(&server, "Earthwork", json!([])).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Construction"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = aggregator(&server, Duration::from_secs(5)).fetch_day(date()).await;

    assert!(result.is_partial());
    assert_eq!(result.events.len(), 2);
    assert_eq!(result.failures.len(), 1);
    let failure = &result.failures[0];
    assert_eq!(failure.category, Category::Construction);
    assert_eq!(failure.entity, "Construction");
    assert!(failure.error.contains("500"));
    assert!(!failure.unauthorized);
}

#[tokio::test]
async fn slow_record_type_times_out_without_blocking_others() {
    let server = MockServer::start().await;

    for entity in ["Autopsy", "Construction", "Splicing"] {
        mock_list(&server, entity, json!([])).await;
    }
    Mock::given(method("GET"))
        .and(path("/api/v1/Earthwork"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "total": 0, "list": [] }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let result = aggregator(&server, Duration::from_millis(200)).fetch_day(date()).await;

    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].category, Category::Earthwork);
    assert!(result.failures[0].error.contains("did not answer"));
}

#[tokio::test]
async fn sends_token_and_date_filter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/Autopsy"))
        .and(header("Espo-Authorization", TOKEN))
        .and(header("Authorization", format!("Basic {TOKEN}").as_str()))
        .and(query_param("where[0][type]", "on"))
        .and(query_param("where[0][attribute]", "dateStart"))
        .and(query_param("where[0][value]", "2025-03-20"))
        .and(query_param("where[0][dateTime]", "true"))
        .and(query_param("where[0][timeZone]", "Europe/Athens"))
        .and(query_param("orderBy", "dateStart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "total": 0, "list": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = EspoClient::new(&server.uri(), TOKEN, Duration::from_secs(5), 200).unwrap();
    let records = client
        .list_on_date("Autopsy", "dateStart", date(), chrono_tz::Europe::Athens)
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn day_is_the_local_calendar_day() {
    let server = MockServer::start().await;

    // 22:30 UTC on the 20th is 00:30 on the 21st in Athens
    Mock::given(method("GET"))
        .and(path("/api/v1/Construction"))
        .and(query_param("where[0][timeZone]", "Europe/Athens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "list": [
                { "id": "morning", "dateStart": "2025-03-20 06:00:00" },
                { "id": "late", "dateStart": "2025-03-20 22:30:00" },
            ],
        })))
        .mount(&server)
        .await;
    for entity in ["Autopsy", "Splicing", "Earthwork"] {
        mock_list(&server, entity, json!([])).await;
    }

    let result = aggregator_in(&server, Duration::from_secs(5), chrono_tz::Europe::Athens)
        .fetch_day(date())
        .await;

    assert!(!result.is_partial());
    let ids: Vec<_> = result.events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["morning"]);
    assert!(
        result
            .events
            .iter()
            .all(|e| e.local_date(chrono_tz::Europe::Athens) == date())
    );
}

#[tokio::test]
async fn body_stalling_after_headers_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\n\
                  Content-Type: application/json\r\n\
                  Content-Length: 100\r\n\r\n\
                  {\"total\": 0,",
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    });

    let client = EspoClient::new(
        &format!("http://{addr}"),
        TOKEN,
        Duration::from_millis(200),
        200,
    )
    .unwrap();

    let started = Instant::now();
    let result = tokio::time::timeout(
        Duration::from_secs(3),
        client.list_on_date("Autopsy", "dateStart", date(), chrono_tz::UTC),
    )
    .await
    .expect("client deadline fires before the outer one");

    assert!(matches!(result, Err(EspoError::Timeout { .. })));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn unauthorized_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = aggregator(&server, Duration::from_secs(5)).fetch_day(date()).await;

    assert!(result.events.is_empty());
    assert_eq!(result.failures.len(), 4);
    assert!(result.failures.iter().all(|f| f.unauthorized));
}

#[tokio::test]
async fn fetch_range_covers_every_day() {
    let server = MockServer::start().await;

    for day in 17..=23 {
        Mock::given(method("GET"))
            .and(path("/api/v1/Construction"))
            .and(query_param("where[0][value]", format!("2025-03-{day}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 1,
                "list": [{
                    "id": format!("c{day}"),
                    "dateStart": format!("2025-03-{day} 09:00:00"),
                }],
            })))
            .mount(&server)
            .await;
    }
    for entity in ["Autopsy", "Splicing", "Earthwork"] {
        mock_list(&server, entity, json!([])).await;
    }

    let result = aggregator(&server, Duration::from_secs(5))
        .fetch_range(DateRange::week_of(date()))
        .await;

    assert!(!result.is_partial());
    let ids: Vec<_> = result.events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["c17", "c18", "c19", "c20", "c21", "c22", "c23"]);
}

#[tokio::test]
async fn fetch_record_returns_raw_object() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/Splicing/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "s1",
            "name": "K-114",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Splicing/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&server)
        .await;

    let agg = aggregator(&server, Duration::from_secs(5));
    let record = agg.fetch_record(Category::Splicing, "s1").await.unwrap();
    assert_eq!(record["name"], "K-114");

    let missing = agg.fetch_record(Category::Splicing, "missing").await;
    assert!(matches!(missing, Err(EspoError::Status { status: 404, .. })));
}
