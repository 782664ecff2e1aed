//! Tests for pagination module

use super::*;
use crate::decode::{FetchedItem, FetchedUser};
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use crate::partition::SourcePartition;
use crate::state::Cursor;
use crate::types::{BackoffType, Timestamp};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ts(secs: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + ChronoDuration::seconds(secs)
}

fn item(number: u64, updated_at: Timestamp) -> FetchedItem {
    FetchedItem {
        id: 1000 + number,
        number,
        url: format!("https://api.github.com/repos/octo/hello/issues/{number}"),
        title: format!("Issue {number}"),
        state: "open".to_string(),
        created_at: ts(0),
        updated_at,
        user: Some(FetchedUser {
            url: "https://api.github.com/users/octocat".to_string(),
            id: 1,
            login: "octocat".to_string(),
        }),
        pull_request: None,
    }
}

fn page_of(count: usize, threshold: usize, fetched_at: Timestamp) -> Page {
    let items = (0..count)
        .map(|i| item(i as u64 + 1, ts(100 + i as i64)))
        .collect();
    Page::new(items, threshold, fetched_at)
}

fn manager() -> CursorManager {
    CursorManager::new(CursorManagerConfig::default(), Cursor::start(ts(0)))
}

// ============================================================================
// Page Tests
// ============================================================================

#[test]
fn test_page_full_and_partial() {
    let full = page_of(100, 100, ts(10_000));
    assert!(full.is_full());
    assert_eq!(full.len(), 100);

    let partial = page_of(40, 100, ts(10_000));
    assert!(!partial.is_full());
    assert!(!partial.is_empty());

    let empty = Page::empty(100, ts(10_000));
    assert!(!empty.is_full());
    assert!(empty.is_empty());
    assert_eq!(empty.max_updated_at(), None);
}

#[test]
fn test_page_max_updated_at_ignores_order() {
    let page = Page::new(
        vec![item(1, ts(50)), item(2, ts(70)), item(3, ts(60))],
        100,
        ts(1000),
    );
    assert_eq!(page.max_updated_at(), Some(ts(70)));
    assert_eq!(page.threshold(), 100);
    assert_eq!(page.fetched_at(), ts(1000));
    assert_eq!(page.into_items().len(), 3);
}

// ============================================================================
// CursorManager Tests
// ============================================================================

#[test]
fn test_init_uses_persisted_cursor() {
    let persisted = Cursor::new(ts(42), 3);
    let cursor = CursorManager::init(Some(persisted), Duration::from_secs(3600), ts(10_000));
    assert_eq!(cursor, persisted);
}

#[test]
fn test_init_applies_lookback() {
    let cursor = CursorManager::init(None, Duration::from_secs(3600), ts(10_000));
    assert_eq!(cursor, Cursor::new(ts(10_000 - 3600), 1));
}

#[test]
fn test_lookback_start_clamps_huge_lookback() {
    let start = CursorManager::lookback_start(Duration::from_secs(u64::MAX), ts(0));
    assert!(start < ts(0));
}

#[test]
fn test_advance_full_page_turns_page() {
    let manager = manager();
    let cursor = Cursor::new(ts(0), 1);
    let next = manager.advance(&cursor, &page_of(100, 100, ts(10_000)));
    assert_eq!(next, Cursor::new(ts(0), 2));

    let next = manager.advance(&next, &page_of(100, 100, ts(10_000)));
    assert_eq!(next, Cursor::new(ts(0), 3));
}

#[test]
fn test_advance_partial_page_closes_window() {
    let manager = manager();
    let cursor = Cursor::new(ts(0), 2);
    let page = page_of(40, 100, ts(10_000));
    let max = page.max_updated_at().unwrap();

    let next = manager.advance(&cursor, &page);
    assert_eq!(next, Cursor::new(max + ChronoDuration::seconds(1), 1));
}

#[test]
fn test_advance_partial_page_holds_open_boundary() {
    let manager = manager();
    let cursor = Cursor::new(ts(0), 1);
    // newest item was modified within the last tick before the fetch
    let page = Page::new(vec![item(1, ts(99))], 100, ts(99) + ChronoDuration::milliseconds(500));

    assert_eq!(manager.advance(&cursor, &page), cursor);
}

#[test]
fn test_advance_boundary_exactly_elapsed() {
    let manager = manager();
    let cursor = Cursor::new(ts(0), 1);
    let page = Page::new(vec![item(1, ts(99))], 100, ts(100));

    assert_eq!(manager.advance(&cursor, &page), Cursor::new(ts(100), 1));
}

#[test]
fn test_advance_uses_configured_tick() {
    let manager = CursorManager::new(
        CursorManagerConfig {
            tick: Duration::from_millis(1),
            ..CursorManagerConfig::default()
        },
        Cursor::start(ts(0)),
    );
    let page = Page::new(vec![item(1, ts(99))], 100, ts(200));
    let next = manager.advance(&Cursor::start(ts(0)), &page);
    assert_eq!(next.since, ts(99) + ChronoDuration::milliseconds(1));
}

#[test]
fn test_advance_empty_page_is_noop() {
    let manager = manager();
    let cursor = Cursor::new(ts(5), 4);
    assert_eq!(manager.advance(&cursor, &Page::empty(100, ts(10_000))), cursor);
}

#[test]
fn test_advance_never_moves_since_backwards() {
    let manager = manager();
    let cursor = Cursor::new(ts(500), 3);
    let page = Page::new(vec![item(1, ts(10))], 100, ts(10_000));

    let next = manager.advance(&cursor, &page);
    assert_eq!(next, cursor);
}

#[test]
fn test_advance_boundary_equal_to_since_keeps_page() {
    let manager = manager();
    // max updated_at 499 plus a one second tick lands exactly on since
    let cursor = Cursor::new(ts(500), 4);
    let page = Page::new(vec![item(1, ts(499))], 100, ts(10_000));

    assert_eq!(manager.advance(&cursor, &page), cursor);
}

#[test]
fn test_since_is_monotonic_across_sequence() {
    let manager = manager();
    let mut cursor = Cursor::start(ts(0));
    let pages = [
        page_of(100, 100, ts(10_000)),
        page_of(100, 100, ts(10_000)),
        page_of(7, 100, ts(10_000)),
        Page::empty(100, ts(10_100)),
        Page::new(vec![item(9, ts(5000))], 100, ts(10_200)),
    ];

    for page in &pages {
        let next = manager.advance(&cursor, page);
        assert!(next.since >= cursor.since);
        if next.since > cursor.since {
            assert_eq!(next.page, 1);
        } else {
            assert!(next.page >= cursor.page);
        }
        cursor = next;
    }
    assert_eq!(cursor, Cursor::new(ts(5001), 1));
}

#[test]
fn test_inter_poll_delay() {
    let manager = CursorManager::new(
        CursorManagerConfig {
            tick: Duration::from_secs(1),
            idle_delay: Duration::from_secs(60),
            busy_delay: Duration::from_millis(250),
        },
        Cursor::start(ts(0)),
    );

    assert_eq!(
        manager.inter_poll_delay(&page_of(100, 100, ts(10_000))),
        Duration::from_millis(250)
    );
    assert_eq!(
        manager.inter_poll_delay(&page_of(3, 100, ts(10_000))),
        Duration::from_secs(60)
    );
    assert_eq!(
        manager.inter_poll_delay(&Page::empty(100, ts(10_000))),
        Duration::from_secs(60)
    );
}

#[test]
fn test_current_and_record() {
    let mut manager = manager();
    assert_eq!(manager.current(), Cursor::start(ts(0)));

    manager.record(Cursor::new(ts(0), 2));
    assert_eq!(manager.current(), Cursor::new(ts(0), 2));
    assert_eq!(manager.config().idle_delay, Duration::from_secs(60));
}

// ============================================================================
// IssueFetcher Tests
// ============================================================================

fn fetcher(uri: String, page_size: usize) -> IssueFetcher {
    let config = HttpClientConfig::builder()
        .base_url(uri)
        .max_retries(1)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_millis(10),
        )
        .no_rate_limit()
        .build();
    IssueFetcher::new(HttpClient::with_config(config).unwrap(), page_size)
}

fn issue_json(number: u64, updated_at: &str) -> serde_json::Value {
    json!({
        "id": 9000 + number,
        "number": number,
        "url": format!("https://api.github.com/repos/octo/hello/issues/{number}"),
        "title": "Something broke",
        "state": "open",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": updated_at,
        "user": {"url": "https://api.github.com/users/octocat", "id": 1, "login": "octocat"}
    })
}

#[tokio::test]
async fn test_fetch_page_sends_cursor_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .and(query_param("since", "2024-01-01T00:00:00Z"))
        .and(query_param("page", "2"))
        .and(query_param("per_page", "100"))
        .and(query_param("sort", "updated"))
        .and(query_param("direction", "asc"))
        .and(query_param("state", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            issue_json(1, "2024-01-02T00:00:00Z"),
            issue_json(2, "2024-01-03T00:00:00Z"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(mock_server.uri(), 100);
    let partition = SourcePartition::new("octo", "hello");
    let page = fetcher
        .fetch_page(&partition, &Cursor::new(ts(0), 2))
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    assert!(!page.is_full());
    assert_eq!(page.items()[1].number, 2);
    assert_eq!(page.threshold(), 100);
}

#[tokio::test]
async fn test_fetch_page_full_with_small_page_size() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .and(query_param("per_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            issue_json(1, "2024-01-02T00:00:00Z"),
            issue_json(2, "2024-01-03T00:00:00Z"),
        ])))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(mock_server.uri(), 2);
    let page = fetcher
        .fetch_page(&SourcePartition::new("octo", "hello"), &Cursor::start(ts(0)))
        .await
        .unwrap();

    assert!(page.is_full());
}

#[tokio::test]
async fn test_fetch_page_empty_array() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(mock_server.uri(), 100);
    let page = fetcher
        .fetch_page(&SourcePartition::new("octo", "hello"), &Cursor::start(ts(0)))
        .await
        .unwrap();

    assert!(page.is_empty());
}

#[tokio::test]
async fn test_fetch_page_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(mock_server.uri(), 100);
    let err = fetcher
        .fetch_page(&SourcePartition::new("octo", "hello"), &Cursor::start(ts(0)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::RateLimited {
            retry_after_seconds: 30
        }
    ));
    assert!(!fetcher.client().gate().is_open());
}

#[tokio::test]
async fn test_fetch_page_not_found_is_hard_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/octo/missing/issues"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(mock_server.uri(), 100);
    let err = fetcher
        .fetch_page(&SourcePartition::new("octo", "missing"), &Cursor::start(ts(0)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_fetch_page_malformed_item_fails_page() {
    let mock_server = MockServer::start().await;
    let mut bad = issue_json(2, "2024-01-03T00:00:00Z");
    bad["updated_at"] = json!(12);

    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/issues"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([issue_json(1, "2024-01-02T00:00:00Z"), bad])),
        )
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(mock_server.uri(), 100);
    let err = fetcher
        .fetch_page(&SourcePartition::new("octo", "hello"), &Cursor::start(ts(0)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MalformedItem { number: 2, .. }));
}
