//! The One API client and its request loop.
//!
//! The [`Client`] type is the main entry point. Use [`ClientBuilder`] to
//! configure retry policies, base URL or transport, or [`Client::new`] for the
//! defaults.

use crate::{
    query::{QueryOptions, SortSpec},
    retry::{RetryBudget, RetryPolicies, RetryPolicy, Verdict},
    transport::{RawResponse, ReqwestTransport, Transport},
    Error, FilterDescriptor, Response, Result,
};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Where The One API lives.
pub const DEFAULT_BASE_URL: &str = "https://the-one-api.dev/v2";

/// A client for The One API.
///
/// Besides its fixed configuration, a client carries session state: the
/// paging, sort and filters set through [`set_limit`](Self::set_limit) and
/// friends. That state is sent with every following request until it is
/// overwritten or cleared. Mutating it needs `&mut self`, so it cannot change
/// while a request borrowed from the same client is in flight. Cloning a
/// client shares the transport and configuration but copies the session
/// state, which makes one clone per task the easy way to use it concurrently.
///
/// # Examples
///
/// ```no_run
/// use lotr::{Client, FilterDescriptor, FilterOperator, Page};
///
/// # async fn example() -> Result<(), lotr::Error> {
/// let mut client = Client::new("my-api-key")?;
///
/// client.set_limit(2);
/// client.set_sort("academyAwardWins", "desc");
/// let movies = client.get_movies::<Page>().await?;
/// println!("{} movies", movies.docs.len());
///
/// client.set_filters(vec![FilterDescriptor::new(
///     "name",
///     FilterOperator::RegexMatch,
///     "king",
/// )]);
/// // limit and sort are still applied here
/// let characters = client.get_characters::<Page>().await?;
/// println!("{} of {} characters", characters.docs.len(), characters.total);
/// # Ok(())
/// # }
/// ```
pub struct Client<T = ReqwestTransport> {
    inner: Arc<ClientInner<T>>,
    options: QueryOptions,
}

struct ClientInner<T> {
    transport: T,
    base_url: String,
    headers: HeaderMap,
    retry_policies: RetryPolicies,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            options: self.options.clone(),
        }
    }
}

impl Client {
    /// Creates a client with the default base URL, retry policies and transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key cannot be sent as a header.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    /// Creates a new `ClientBuilder` for configuring a client.
    ///
    /// ```no_run
    /// use lotr::{Client, RetryPolicy};
    /// use std::time::Duration;
    ///
    /// # fn example() -> Result<(), lotr::Error> {
    /// let client = Client::builder()
    ///     .api_key("my-api-key")
    ///     .rate_limit_policy(RetryPolicy::new(5, Duration::from_secs(30)))
    ///     .retry_policy(RetryPolicy::none())
    ///     .timeout(Duration::from_secs(20))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<T: Transport> Client<T> {
    /// Stores the page size if it is at least 1; otherwise keeps the old one.
    pub fn set_limit(&mut self, limit: i64) {
        self.options.set_limit(limit);
    }

    /// Stores the page number if it is at least 1; otherwise keeps the old one.
    pub fn set_page(&mut self, page: i64) {
        self.options.set_page(page);
    }

    /// Stores the offset if it is not negative; otherwise keeps the old one.
    ///
    /// The API ignores `page` when an offset is present.
    pub fn set_offset(&mut self, offset: i64) {
        self.options.set_offset(offset);
    }

    /// Sorts by `key` in `direction` (`"asc"` or `"desc"`). Ignored when
    /// `key` is empty or the direction is anything else.
    pub fn set_sort(&mut self, key: &str, direction: &str) {
        self.options.set_sort(key, direction);
    }

    pub fn set_sort_spec(&mut self, sort: SortSpec) {
        self.options.set_sort_spec(sort);
    }

    /// Replaces the filter list. Invalid descriptors are not rejected here;
    /// they are left out of the query when a request is built.
    pub fn set_filters(&mut self, filters: Vec<FilterDescriptor>) {
        self.options.set_filters(filters);
    }

    /// The session state sent with each request.
    pub fn query_options(&self) -> &QueryOptions {
        &self.options
    }

    /// Mutable access to the session state, for `clear_*` and `reset`.
    pub fn query_options_mut(&mut self) -> &mut QueryOptions {
        &mut self.options
    }

    pub fn retry_policies(&self) -> RetryPolicies {
        self.inner.retry_policies
    }

    /// The full URL a request to `endpoint` would use right now, including the
    /// query string built from the session state.
    ///
    /// ```
    /// # fn example() -> Result<(), lotr::Error> {
    /// let mut client = lotr::Client::new("my-api-key")?;
    /// client.set_limit(2);
    /// client.set_page(2);
    /// assert_eq!(client.url_for("/movie"), "https://the-one-api.dev/v2/movie?limit=2&page=2");
    /// # Ok(())
    /// # }
    /// ```
    pub fn url_for(&self, endpoint: &str) -> String {
        format!(
            "{}{}{}",
            self.inner.base_url,
            endpoint,
            self.options.to_query_string()
        )
    }

    /// Performs a GET on `endpoint` with the session's query string, retrying
    /// under the client's policies, and decodes the JSON body into `Res`.
    ///
    /// The per-resource methods all go through here; call it directly for
    /// endpoints they do not cover.
    ///
    /// # Errors
    ///
    /// - [`Error::ServerError`] on the first 5xx, without retrying.
    /// - [`Error::ClientError`] once a 4xx has used up its retry budget.
    /// - [`Error::Network`] or [`Error::Timeout`] if the transport fails.
    /// - [`Error::DeserializationFailed`] if the body does not decode into `Res`.
    pub async fn fetch<Res>(&self, endpoint: &str) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        let url = self.url_for(endpoint);
        let start_time = Instant::now();
        let mut budget = RetryBudget::new(self.inner.retry_policies);
        let mut attempt = 0;

        loop {
            attempt += 1;

            tracing::debug!(url = %url, attempt = attempt, "Executing HTTP request");

            let raw = match self.inner.transport.get(&url, &self.inner.headers).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(error = %e, attempt = attempt, endpoint = %endpoint, "Request failed");
                    return Err(e);
                }
            };

            tracing::info!(
                status = raw.status.as_u16(),
                latency_ms = start_time.elapsed().as_millis(),
                attempt = attempt,
                "Received HTTP response"
            );

            match budget.next(raw.status) {
                Verdict::Success => return decode(raw, start_time.elapsed(), attempt),
                Verdict::Retry { delay, reason } => {
                    tracing::info!(
                        delay_ms = delay.as_millis(),
                        attempt = attempt,
                        reason = %reason,
                        "Retrying request after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
                Verdict::ServerFailed => {
                    tracing::warn!(
                        status = raw.status.as_u16(),
                        response = %raw.body,
                        "Server error (5xx)"
                    );
                    return Err(Error::ServerError {
                        status: raw.status,
                        raw_response: raw.body,
                    });
                }
                Verdict::Aborted => {
                    tracing::error!(
                        status = raw.status.as_u16(),
                        attempts = attempt,
                        response = %raw.body,
                        "Client error (4xx), retries exhausted"
                    );
                    return Err(Error::ClientError {
                        status: raw.status,
                        raw_response: raw.body,
                        attempts: attempt,
                    });
                }
            }
        }
    }
}

fn decode<Res>(raw: RawResponse, latency: Duration, attempts: usize) -> Result<Response<Res>>
where
    Res: DeserializeOwned,
{
    match serde_json::from_str::<Res>(&raw.body) {
        Ok(data) => Ok(Response::new(
            data,
            raw.body,
            raw.status,
            raw.headers,
            latency,
            attempts,
        )),
        Err(e) => {
            tracing::error!(
                error = %e,
                raw_response = %raw.body,
                "Failed to deserialize response"
            );

            Err(Error::DeserializationFailed {
                raw_response: raw.body,
                serde_error: e.to_string(),
                status: raw.status,
            })
        }
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// Defaults: base URL [`DEFAULT_BASE_URL`], rate-limit policy of 10 retries
/// 10 seconds apart, generic policy of 3 retries 5 seconds apart, no timeout.
///
/// # Examples
///
/// ```no_run
/// use lotr::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), lotr::Error> {
/// let client = ClientBuilder::new()
///     .api_key("my-api-key")
///     .base_url("https://the-one-api.dev/v2")?
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: String,
    retry_policies: RetryPolicies,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry_policies: RetryPolicies::default(),
            timeout: None,
        }
    }

    /// Sets the key sent as `Authorization: Bearer <key>`.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Overrides the API root, e.g. to point at a mock server.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let parsed = Url::parse(url.as_ref())?;
        self.base_url = parsed.as_str().trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Sets the policy for `429 Too Many Requests` responses.
    pub fn rate_limit_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policies.rate_limit = policy;
        self
    }

    /// Sets the policy for all other 4xx responses.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policies.generic = policy;
        self
    }

    pub fn retry_policies(mut self, policies: RetryPolicies) -> Self {
        self.retry_policies = policies;
        self
    }

    /// Sets the per-request timeout of the default transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds a client using the default reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key was provided, if the key contains
    /// characters that cannot be sent in a header, or if the HTTP client
    /// cannot be built.
    pub fn build(self) -> Result<Client> {
        let transport = ReqwestTransport::new(self.timeout)?;
        self.build_with_transport(transport)
    }

    /// Builds a client that sends its requests through `transport`.
    ///
    /// The timeout setting does not apply; configure it on the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key was provided or if it contains
    /// characters that cannot be sent in a header.
    pub fn build_with_transport<T: Transport>(self, transport: T) -> Result<Client<T>> {
        let api_key = self
            .api_key
            .ok_or_else(|| Error::ConfigurationError("API key is required".to_string()))?;
        let headers = default_headers(&api_key)?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                base_url: self.base_url,
                headers,
                retry_policies: self.retry_policies,
            }),
            options: QueryOptions::default(),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_headers(api_key: &str) -> Result<HeaderMap> {
    let mut authorization = HeaderValue::try_from(format!("Bearer {api_key}"))
        .map_err(|e| Error::ConfigurationError(format!("Invalid API key: {}", e)))?;
    authorization.set_sensitive(true);

    let json = HeaderValue::from_static("application/json");
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(CONTENT_TYPE, json.clone());
    headers.insert(ACCEPT, json);
    Ok(headers)
}
