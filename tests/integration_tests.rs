//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: config → HTTP requests → records → state file

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use issue_source::config::SourceConfig;
use issue_source::engine::PollLoop;
use issue_source::http::HttpClient;
use issue_source::output::{MemorySink, RecordMapper, RecordSink};
use issue_source::pagination::IssueFetcher;
use issue_source::state::{Cursor, CursorStore, FileCursorStore};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const S0: &str = "2024-01-01T00:00:00Z";

fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-02T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn issue(number: u64) -> Value {
    let updated = base_time() + ChronoDuration::seconds(number as i64);
    json!({
        "id": 70_000 + number,
        "number": number,
        "url": format!("https://api.github.com/repos/octo/hello/issues/{number}"),
        "title": format!("Issue {number}"),
        "state": if number % 2 == 0 { "closed" } else { "open" },
        "created_at": "2024-01-01T12:00:00Z",
        "updated_at": updated.to_rfc3339(),
        "user": {
            "url": "https://api.github.com/users/octocat",
            "id": 583231,
            "login": "octocat"
        }
    })
}

fn issues(range: std::ops::RangeInclusive<u64>) -> Value {
    Value::Array(range.map(issue).collect())
}

fn config(server: &MockServer, state_file: &Path) -> SourceConfig {
    let yaml = format!(
        r#"
owner: octo
repository: hello
topic: github-issues
since: "{S0}"
base_url: "{}"
idle_delay_secs: 60
http:
  max_retries: 0
  requests_per_second: 0
state_file: "{}"
"#,
        server.uri(),
        state_file.display()
    );
    let config = SourceConfig::from_yaml(&yaml).unwrap();
    config.validate().unwrap();
    config
}

fn poll_loop(config: &SourceConfig, sink: Box<dyn RecordSink>) -> PollLoop {
    let client = HttpClient::with_auth(config.http_client_config(), config.auth_config()).unwrap();
    let gate = client.gate().clone();

    PollLoop::new(
        config.partition(),
        RecordMapper::new(config.topic.clone()),
        Box::new(IssueFetcher::new(client, config.page_size)),
        sink,
        Arc::new(FileCursorStore::open(&config.state_file).unwrap()),
    )
    .with_config(config.poll_config().unwrap())
    .with_gate(gate)
}

fn read_state(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// ============================================================================
// Full / Partial / Empty Scenario
// ============================================================================

#[tokio::test]
async fn test_full_partial_empty_cycles() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let state_file = dir.path().join("state.json");
    let next_since = "2024-01-02T00:02:21Z"; // issue 140 updated at +140s, plus one tick

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .and(query_param("since", S0))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "100"))
        .and(query_param("sort", "updated"))
        .and(query_param("direction", "asc"))
        .and(query_param("state", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issues(1..=100)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .and(query_param("since", S0))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issues(101..=140)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .and(query_param("since", next_since))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&server, &state_file);
    let sink = MemorySink::new();
    let mut poll = poll_loop(&config, Box::new(sink.clone()));

    let first = poll.poll_once().await.unwrap();
    assert_eq!(first.records, 100);
    assert!(first.full);
    assert_eq!(first.delay, Duration::ZERO);
    assert_eq!(read_state(&state_file)["partitions"]["octo/hello"]["next_page"], "2");
    assert_eq!(read_state(&state_file)["partitions"]["octo/hello"]["updated_at"], S0);

    let second = poll.poll_once().await.unwrap();
    assert_eq!(second.records, 40);
    assert!(!second.full);
    assert_eq!(second.cursor.page, 1);
    assert_eq!(second.delay, Duration::from_secs(60));
    assert_eq!(
        read_state(&state_file)["partitions"]["octo/hello"],
        json!({"updated_at": next_since, "next_page": "1"})
    );

    let third = poll.poll_once().await.unwrap();
    assert_eq!(third.records, 0);
    assert_eq!(third.cursor, second.cursor);
    assert_eq!(third.delay, Duration::from_secs(60));

    let records = sink.records();
    assert_eq!(records.len(), 140);
    assert_eq!(records[0].key.number, 1);
    assert_eq!(records[139].key.number, 140);
    assert_eq!(records[0].topic, "github-issues");
    assert_eq!(records[0].key.owner, "octo");
    assert_eq!(records[0].key.repository, "hello");
    assert_eq!(
        records[0].timestamp_ms,
        (base_time() + ChronoDuration::seconds(1)).timestamp_millis()
    );
}

// ============================================================================
// Restart
// ============================================================================

#[tokio::test]
async fn test_restart_resumes_persisted_page() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let state_file = dir.path().join("state.json");
    std::fs::write(
        &state_file,
        json!({"partitions": {"octo/hello": {"updated_at": S0, "next_page": "2"}}}).to_string(),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issues(1..=100)))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .and(query_param("since", S0))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issues(101..=140)))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&server, &state_file);
    let sink = MemorySink::new();
    let mut poll = poll_loop(&config, Box::new(sink.clone()));

    let resumed = poll.resume().await.unwrap();
    assert_eq!(resumed.page, 2);

    let outcome = poll.poll_once().await.unwrap();
    assert_eq!(outcome.records, 40);
    assert_eq!(sink.records()[0].key.number, 101);
}

#[tokio::test]
async fn test_interrupted_page_is_replayed_after_restart() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let state_file = dir.path().join("state.json");

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .and(query_param("since", S0))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issues(1..=5)))
        .expect(2)
        .mount(&server)
        .await;

    let config = config(&server, &state_file);

    // the sink fails on the fourth record
    let mut first_run = poll_loop(&config, Box::new(MemorySink::failing_after(3)));
    assert!(first_run.poll_once().await.is_err());

    let store = FileCursorStore::open(&state_file).unwrap();
    let persisted = store.load(&config.partition()).await.unwrap().unwrap();
    assert_eq!(persisted.updated_at.as_deref(), Some(S0));
    assert_eq!(persisted.next_page.as_deref(), Some("1"));

    let sink = MemorySink::new();
    let mut second_run = poll_loop(&config, Box::new(sink.clone()));
    let outcome = second_run.poll_once().await.unwrap();

    assert_eq!(outcome.records, 5);
    assert_eq!(sink.records()[0].key.number, 1);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_run_recovers_from_rate_limit() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let state_file = dir.path().join("state.json");

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("retry-after", "0"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .and(query_param("since", S0))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issues(1..=3)))
        .mount(&server)
        .await;

    let config = config(&server, &state_file);
    let sink = MemorySink::new();
    let mut poll = poll_loop(&config, Box::new(sink.clone()));

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    let watched = sink.clone();
    tokio::spawn(async move {
        while watched.len() < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        stopper.cancel();
    });

    let stats = tokio::time::timeout(Duration::from_secs(10), poll.run(cancel))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(stats.rate_limited, 1);
    assert_eq!(stats.records_emitted, 3);
    assert_eq!(poll.cursor().unwrap().page, 1);
}

#[tokio::test]
async fn test_missing_user_stops_loop_without_commit() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let state_file = dir.path().join("state.json");

    let mut body = issues(1..=3);
    body[2].as_object_mut().unwrap().remove("user");

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let config = config(&server, &state_file);
    let sink = MemorySink::new();
    let mut poll = poll_loop(&config, Box::new(sink.clone()));

    let err = poll.run(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(
        err,
        issue_source::Error::MalformedItem { number: 3, .. }
    ));
    assert!(sink.is_empty());
    assert!(!state_file.exists());
    assert_eq!(
        poll.cursor(),
        Some(Cursor::start(
            DateTime::parse_from_rfc3339(S0).unwrap().with_timezone(&Utc)
        ))
    );
}

#[tokio::test]
async fn test_missing_repository_is_fatal() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    let config = config(&server, &dir.path().join("state.json"));
    let mut poll = poll_loop(&config, Box::new(MemorySink::new()));

    let err = poll.run(CancellationToken::new()).await.unwrap_err();
    assert!(matches!(
        err,
        issue_source::Error::HttpStatus { status: 404, .. }
    ));
}
