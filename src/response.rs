//! Decoded responses and the API's listing envelope.
//!
//! Every endpoint of The One API, including the single-document ones, answers
//! with the same envelope: a `docs` array plus paging counters. [`Page`]
//! models it; [`Response`] wraps whatever type the caller decoded into,
//! together with details of the HTTP exchange.

use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// A decoded response plus details of the exchange that produced it.
///
/// # Examples
///
/// ```no_run
/// use lotr::{Client, Page};
///
/// # async fn example() -> Result<(), lotr::Error> {
/// let client = Client::new("my-api-key")?;
/// let movies = client.get_movies::<Page>().await?;
///
/// println!("{} of {} movies", movies.docs.len(), movies.total);
/// println!("took {:?} over {} attempt(s)", movies.latency, movies.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded body.
    pub data: T,

    /// The body exactly as received.
    pub raw_body: String,

    /// Status of the final, successful attempt.
    pub status: StatusCode,

    /// Headers of the final attempt.
    pub headers: HeaderMap,

    /// Time from the first attempt to the final response, retry delays included.
    pub latency: Duration,

    /// `1` when the first attempt succeeded.
    pub attempts: usize,
}

impl<T> Response<T> {
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
            attempts,
        }
    }

    /// Maps the decoded data while keeping the exchange details.
    ///
    /// ```
    /// # use lotr::{Page, Response};
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let page: Page = serde_json::from_str(r#"{"docs":[{"name":"Frodo"}],"total":1}"#).unwrap();
    /// let response = Response::new(page, String::new(), StatusCode::OK, HeaderMap::new(), Duration::ZERO, 1);
    ///
    /// let total = response.map(|page| page.total);
    /// assert_eq!(total.data, 1);
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            attempts: self.attempts,
        }
    }

    /// Returns `true` if at least one retry happened.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a header of the final attempt as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

/// The envelope every endpoint answers with.
///
/// `T` defaults to `serde_json::Value`; callers who know a resource's shape
/// can decode `docs` straight into their own type. Counters missing from a
/// response default to zero / `None`.
///
/// ```
/// use lotr::Page;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Movie {
///     name: String,
///     #[serde(rename = "academyAwardWins")]
///     academy_award_wins: u32,
/// }
///
/// let body = r#"{
///     "docs": [{"_id": "5cd95395de30eff6ebccde5d", "name": "The Return of the King", "academyAwardWins": 11}],
///     "total": 8, "limit": 1, "offset": 0, "page": 1, "pages": 8
/// }"#;
/// let page: Page<Movie> = serde_json::from_str(body).unwrap();
///
/// assert_eq!(page.docs[0].academy_award_wins, 11);
/// assert_eq!(page.pages, Some(8));
/// assert!(page.has_more());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page<T = serde_json::Value> {
    pub docs: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub pages: Option<u64>,
}

impl<T> Page<T> {
    /// Whether a later page exists, judged from `page` and `pages`.
    pub fn has_more(&self) -> bool {
        match (self.page, self.pages) {
            (Some(page), Some(pages)) => page < pages,
            _ => false,
        }
    }

    /// The first document, which is the whole answer for by-id endpoints.
    pub fn first(&self) -> Option<&T> {
        self.docs.first()
    }
}
