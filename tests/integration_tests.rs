//! Integration tests using wiremock to simulate The One API, plus a recording
//! transport for cases that must not hit the network or that count delays.

use http::StatusCode;
use lotr::transport::{RawResponse, Transport};
use lotr::{
    Client, Error, FilterDescriptor, FilterOperator, Page, RetryPolicies, RetryPolicy,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const API_KEY: &str = "test-key";

#[derive(Debug, Deserialize, PartialEq)]
struct Movie {
    name: String,
}

/// Matches the request's raw query string exactly (`None` for no query).
struct RawQuery(Option<&'static str>);

impl Match for RawQuery {
    fn matches(&self, request: &Request) -> bool {
        request.url.query() == self.0
    }
}

fn fast_policies() -> RetryPolicies {
    RetryPolicies {
        rate_limit: RetryPolicy::new(2, Duration::from_millis(20)),
        generic: RetryPolicy::new(2, Duration::from_millis(10)),
    }
}

fn mock_client(server: &MockServer) -> Client {
    Client::builder()
        .api_key(API_KEY)
        .base_url(server.uri())
        .unwrap()
        .retry_policies(fast_policies())
        .build()
        .unwrap()
}

fn page_of(names: &[&str], total: u64, limit: u64, page: u64, pages: u64) -> serde_json::Value {
    let docs: Vec<_> = names.iter().map(|name| json!({ "name": name })).collect();
    json!({
        "docs": docs,
        "total": total,
        "limit": limit,
        "offset": 0,
        "page": page,
        "pages": pages,
    })
}

const ALL_MOVIES: [&str; 8] = [
    "The Lord of the Rings Series",
    "The Hobbit Series",
    "The Unexpected Journey",
    "The Desolation of Smaug",
    "The Battle of the Five Armies",
    "The Two Towers",
    "The Fellowship of the Ring",
    "The Return of the King",
];

#[tokio::test]
async fn test_list_movies_sends_auth_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/movie"))
        .and(RawQuery(None))
        .and(header("authorization", "Bearer test-key"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_of(&ALL_MOVIES, 8, 1000, 1, 1)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = mock_client(&mock_server);
    let movies = client.get_movies::<Page<Movie>>().await.unwrap();

    assert_eq!(movies.total, 8);
    assert_eq!(movies.docs.len(), 8);
    assert_eq!(movies.attempts, 1);
    assert!(!movies.was_retried());
    assert_eq!(movies.status, StatusCode::OK);
}

#[tokio::test]
async fn test_limit_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/movie"))
        .and(RawQuery(Some("limit=2")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_of(&ALL_MOVIES[..2], 8, 2, 1, 4)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = mock_client(&mock_server);
    client.set_limit(2);
    let movies = client.get_movies::<Page<Movie>>().await.unwrap();

    assert_eq!(movies.docs.len(), 2);
    assert_eq!(movies.limit, Some(2));
}

#[tokio::test]
async fn test_limit_and_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/movie"))
        .and(RawQuery(Some("limit=2&page=2")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_of(&ALL_MOVIES[2..4], 8, 2, 2, 4)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = mock_client(&mock_server);
    client.set_limit(2);
    client.set_page(2);
    let movies = client.get_movies::<Page<Movie>>().await.unwrap();

    let names: Vec<_> = movies.docs.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["The Unexpected Journey", "The Desolation of Smaug"]);
}

#[tokio::test]
async fn test_offset_and_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/movie"))
        .and(query_param("limit", "2"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_of(&ALL_MOVIES[1..3], 8, 2, 1, 4)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = mock_client(&mock_server);
    client.set_offset(1);
    client.set_limit(2);
    let movies = client.get_movies::<Page<Movie>>().await.unwrap();

    let names: Vec<_> = movies.docs.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["The Hobbit Series", "The Unexpected Journey"]);
    assert_eq!(movies.limit, Some(2));
}

#[tokio::test]
async fn test_sort_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/movie"))
        .and(query_param("limit", "2"))
        .and(query_param("sort", "academyAwardWins:desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_of(
            &["The Lord of the Rings Series", "The Return of the King"],
            8,
            2,
            1,
            4,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = mock_client(&mock_server);
    client.set_limit(2);
    client.set_sort("academyAwardWins", "desc");
    let movies = client.get_movies::<Page<Movie>>().await.unwrap();

    assert_eq!(movies.docs[1].name, "The Return of the King");
}

#[tokio::test]
async fn test_filtered_characters_across_two_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/character"))
        .and(RawQuery(Some("limit=3&race=Hobbit,Human&hair!=Blonde&name=/king/i")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_of(
            &[
                "Eldacar (King of Arnor)",
                "Eldacar (King of Gondor)",
                "The King of the Dead",
            ],
            4,
            3,
            1,
            2,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/character"))
        .and(RawQuery(Some("limit=3&page=2&race=Hobbit,Human&hair!=Blonde&name=/king/i")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_of(
            &["Aragorn II Elessar"],
            4,
            3,
            2,
            2,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = mock_client(&mock_server);
    client.set_limit(3);
    client.set_filters(vec![
        FilterDescriptor::new("race", FilterOperator::Include, "Hobbit,Human"),
        FilterDescriptor::new("hair", FilterOperator::NotMatch, "Blonde"),
        FilterDescriptor::new("name", FilterOperator::RegexMatch, "king"),
    ]);

    let first = client.get_characters::<Page>().await.unwrap();
    assert_eq!(first.total, 4);
    assert_eq!(first.pages, Some(2));
    assert_eq!(first.docs.len(), 3);
    assert!(first.has_more());

    client.set_page(2);
    let second = client.get_characters::<Page>().await.unwrap();
    assert_eq!(second.docs.len(), 1);
    assert_eq!(first.docs.len() + second.docs.len(), 4);
    assert!(!second.has_more());
}

#[tokio::test]
async fn test_non_numeric_comparison_filter_is_dropped() {
    let mock_server = MockServer::start().await;

    // no query string at all: the only filter was invalid
    Mock::given(method("GET"))
        .and(path("/movie"))
        .and(RawQuery(None))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_of(&ALL_MOVIES, 8, 1000, 1, 1)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = mock_client(&mock_server);
    client.set_filters(vec![FilterDescriptor::new(
        "boxOfficeRevenueInMillions",
        FilterOperator::LessThan,
        "a",
    )]);
    let movies = client.get_movies::<Page<Movie>>().await.unwrap();

    assert_eq!(movies.total, 8);
    assert_eq!(movies.pages, Some(1));
    assert_eq!(movies.docs.len(), 8);
}

#[tokio::test]
async fn test_session_state_persists_between_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_of(&["x"], 100, 1, 1, 100)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut client = mock_client(&mock_server);
    client.set_limit(1);
    client.get_quotes::<Page>().await.unwrap();
    client.get_chapters::<Page>().await.unwrap();
}

#[tokio::test]
async fn test_by_id_paths() {
    let mock_server = MockServer::start().await;
    let id = "5cd95395de30eff6ebccde5b";

    for p in [
        format!("/book/{id}"),
        format!("/book/{id}chapter"),
        format!("/movie/{id}"),
        format!("/movie/{id}/quote"),
        format!("/character/{id}"),
        format!("/character/{id}/quote"),
        format!("/quote/{id}"),
        format!("/chapter/{id}"),
    ] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_of(&["doc"], 1, 1000, 1, 1)))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let client = mock_client(&mock_server);
    client.get_book::<Page>(id).await.unwrap();
    client.get_book_chapters::<Page>(id).await.unwrap();
    client.get_movie::<Page>(id).await.unwrap();
    client.get_movie_quotes::<Page>(id).await.unwrap();
    client.get_character::<Page>(id).await.unwrap();
    client.get_character_quotes::<Page>(id).await.unwrap();
    client.get_quote::<Page>(id).await.unwrap();
    client.get_chapter::<Page>(id).await.unwrap();
}

#[tokio::test]
async fn test_retry_client_error_then_success() {
    let mock_server = MockServer::start().await;
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    Mock::given(method("GET"))
        .and(path("/book"))
        .respond_with(move |_req: &Request| {
            let count = attempt_count_clone.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                ResponseTemplate::new(404).set_body_string("Not found")
            } else {
                ResponseTemplate::new(200).set_body_json(page_of(&["The Fellowship Of The Ring"], 3, 1000, 1, 1))
            }
        })
        .mount(&mock_server)
        .await;

    let client = mock_client(&mock_server);
    let books = client.get_books::<Page>().await.unwrap();

    assert_eq!(books.attempts, 3);
    assert!(books.was_retried());
    assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_client_error_exhausts_generic_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/book"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = mock_client(&mock_server);
    let result = client.get_books::<Page>().await;

    match result {
        Err(Error::ClientError {
            status,
            raw_response,
            attempts,
        }) => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(raw_response, "Unauthorized");
            // 1 initial + 2 generic retries
            assert_eq!(attempts, 3);
        }
        other => panic!("Expected ClientError, got {:?}", other.map(|r| r.status)),
    }
}

#[tokio::test]
async fn test_rate_limit_falls_back_to_generic_budget() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too many requests"))
        .expect(5)
        .mount(&mock_server)
        .await;

    let client = mock_client(&mock_server);
    let err = client.get_quotes::<Page>().await.unwrap_err();

    // 1 initial + 2 rate-limit retries + 2 generic retries
    assert!(err.is_rate_limited());
    assert!(matches!(err, Error::ClientError { attempts: 5, .. }));
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/movie"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = mock_client(&mock_server);
    let err = client.get_movies::<Page>().await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(err.raw_response(), Some("Server error"));
    assert!(matches!(err, Error::ServerError { .. }));
}

#[tokio::test]
async fn test_deserialization_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_string("invalid json"))
        .mount(&mock_server)
        .await;

    let client = mock_client(&mock_server);
    let result = client.get_movies::<Page>().await;

    match result {
        Err(Error::DeserializationFailed {
            raw_response,
            serde_error,
            status,
        }) => {
            assert_eq!(status.as_u16(), 200);
            assert_eq!(raw_response, "invalid json");
            assert!(serde_error.contains("expected"));
        }
        other => panic!("Expected DeserializationFailed, got {:?}", other.map(|r| r.status)),
    }
}

#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/movie"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_of(&ALL_MOVIES, 8, 1000, 1, 1))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .api_key(API_KEY)
        .base_url(mock_server.uri())
        .unwrap()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let result = client.get_movies::<Page>().await;
    assert!(matches!(result, Err(Error::Timeout)));
}

/// A transport that replays scripted responses and records every URL it is
/// asked for. The last scripted response repeats once the script runs out.
#[derive(Clone, Default)]
struct SpyTransport {
    state: Arc<SpyState>,
}

#[derive(Default)]
struct SpyState {
    responses: Mutex<VecDeque<RawResponse>>,
    calls: Mutex<Vec<String>>,
}

impl SpyTransport {
    fn scripted(script: &[(u16, &str)]) -> Self {
        let spy = Self::default();
        {
            let mut responses = spy.state.responses.lock().unwrap();
            for (status, body) in script {
                responses.push_back(RawResponse::new(
                    StatusCode::from_u16(*status).unwrap(),
                    *body,
                ));
            }
        }
        spy
    }

    fn calls(&self) -> Vec<String> {
        self.state.calls.lock().unwrap().clone()
    }
}

impl Transport for SpyTransport {
    async fn get(&self, url: &str, _headers: &http::HeaderMap) -> lotr::Result<RawResponse> {
        self.state.calls.lock().unwrap().push(url.to_string());
        let mut responses = self.state.responses.lock().unwrap();
        let response = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        Ok(response.unwrap_or_else(|| RawResponse::new(StatusCode::OK, "{}")))
    }
}

fn spy_client(spy: &SpyTransport) -> Client<SpyTransport> {
    Client::builder()
        .api_key(API_KEY)
        .base_url("http://lotr.test/v2")
        .unwrap()
        .build_with_transport(spy.clone())
        .unwrap()
}

#[tokio::test]
async fn test_invalid_id_never_calls_transport() {
    let spy = SpyTransport::scripted(&[(200, r#"{"docs": []}"#)]);
    let client = spy_client(&spy);

    let result = client.get_movie::<Page>("bad id").await;
    assert!(matches!(result, Err(Error::InvalidIdentifier(ref id)) if id == "bad id"));

    assert!(client.get_book::<Page>("").await.is_err());
    assert!(client.get_book_chapters::<Page>("zz").await.is_err());
    assert!(client.get_movie_quotes::<Page>("5cd9-").await.is_err());
    assert!(client.get_character::<Page>("gandalf").await.is_err());
    assert!(client.get_character_quotes::<Page>(" ").await.is_err());
    assert!(client.get_quote::<Page>("12 34").await.is_err());
    assert!(client.get_chapter::<Page>("../book").await.is_err());

    assert!(spy.calls().is_empty());
}

#[tokio::test]
async fn test_comparison_filters_and_sort_in_url() {
    let spy = SpyTransport::scripted(&[(200, r#"{"docs": [], "total": 2}"#)]);
    let mut client = spy_client(&spy);

    client.set_limit(1);
    client.set_filters(vec![
        FilterDescriptor::new("boxOfficeRevenueInMillions", FilterOperator::LessThan, 1000),
        FilterDescriptor::new("academyAwardWins", FilterOperator::GreaterOrEqual, 1),
    ]);
    client.set_sort("academyAwardNominations", "desc");
    client.get_movies::<Page>().await.unwrap();

    assert_eq!(
        spy.calls(),
        [
            "http://lotr.test/v2/movie?limit=1&sort=academyAwardNominations%3Adesc&boxOfficeRevenueInMillions<1000&academyAwardWins>=1"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_then_success_waits_one_interval() {
    let spy = SpyTransport::scripted(&[
        (429, "Too many requests"),
        (200, r#"{"docs": [{"name": "The Two Towers"}], "total": 1}"#),
    ]);
    // default policies: 10 s between rate-limit retries
    let client = spy_client(&spy);

    let start = tokio::time::Instant::now();
    let movies = client.get_movies::<Page<Movie>>().await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(movies.docs[0].name, "The Two Towers");
    assert_eq!(movies.attempts, 2);
    assert_eq!(spy.calls().len(), 2);
    assert!(elapsed >= Duration::from_secs(10), "waited {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(15), "waited {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_persistent_server_error_fails_without_delay() {
    let spy = SpyTransport::scripted(&[(503, "Service unavailable")]);
    let client = spy_client(&spy);

    let start = tokio::time::Instant::now();
    let err = client.get_movies::<Page>().await.unwrap_err();

    assert!(matches!(err, Error::ServerError { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(spy.calls().len(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_budgets_reset_per_call() {
    let spy = SpyTransport::scripted(&[(404, "Not found")]);
    let client = Client::builder()
        .api_key(API_KEY)
        .rate_limit_policy(RetryPolicy::none())
        .retry_policy(RetryPolicy::new(1, Duration::from_secs(5)))
        .build_with_transport(spy.clone())
        .unwrap();

    for _ in 0..2 {
        let err = client.get_books::<Page>().await.unwrap_err();
        assert!(matches!(err, Error::ClientError { attempts: 2, .. }));
    }
    assert_eq!(spy.calls().len(), 4);
}
