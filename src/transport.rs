//! The HTTP boundary.
//!
//! [`Client`](crate::Client) only needs to issue a GET with headers and read
//! back a status, headers and body. [`Transport`] captures exactly that, so
//! tests (or callers with special networking needs) can substitute their own.

use crate::{Error, Result};
use http::{HeaderMap, StatusCode};
use std::future::Future;
use std::time::Duration;

/// A status, headers and body read back from the API.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Issues a single GET request.
///
/// Implementations must not retry on their own; retries are the client's job.
///
/// # Examples
///
/// ```
/// use lotr::transport::{RawResponse, Transport};
/// use http::{HeaderMap, StatusCode};
///
/// struct Canned;
///
/// impl Transport for Canned {
///     async fn get(&self, _url: &str, _headers: &HeaderMap) -> lotr::Result<RawResponse> {
///         Ok(RawResponse::new(StatusCode::OK, r#"{"docs":[]}"#))
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    fn get(
        &self,
        url: &str,
        headers: &HeaderMap,
    ) -> impl Future<Output = Result<RawResponse>> + Send;
}

/// The default transport, backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a transport with an optional per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self {
            http_client,
            timeout,
        })
    }

    /// Wraps an already configured `reqwest::Client`.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            timeout: None,
        }
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<RawResponse> {
        let mut request = self.http_client.get(url).headers(headers.clone());
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::Network(e)
    }
}
