//! Error types for One API calls.
//!
//! Every failure a caller can observe is a variant of [`Error`]. Malformed
//! filters are the one deliberate exception: they are dropped from the query
//! instead of failing the call (see [`crate::filter`]).

use http::StatusCode;

/// The main error type for One API calls.
///
/// # Examples
///
/// ```no_run
/// use lotr::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::new("my-api-key")?;
///
/// match client.get_movie::<serde_json::Value>("5cd95395de30eff6ebccde56").await {
///     Ok(movie) => println!("{}", movie.raw_body),
///     Err(Error::ServerError { status, .. }) => eprintln!("API is down ({status})"),
///     Err(Error::ClientError { status, attempts, .. }) => {
///         eprintln!("gave up after {attempts} attempts with {status}")
///     }
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A single-resource accessor was given an identifier that is empty or
    /// not hexadecimal. No request was sent.
    #[error("Invalid id: {0:?}")]
    InvalidIdentifier(String),

    /// The API answered with a 5xx status. These are never retried.
    #[error("API error: {status} {raw_response}")]
    ServerError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
    },

    /// The API answered with a 4xx status and the applicable retry budget
    /// (rate-limit or generic) ran out.
    #[error("API error after {attempts} attempts: {status} {raw_response}")]
    ClientError {
        /// The HTTP status code of the last attempt
        status: StatusCode,
        /// The raw response body of the last attempt
        raw_response: String,
        /// Total number of attempts made, including the first
        attempts: usize,
    },

    /// A network-level error occurred (connection failed, DNS lookup failed, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The transport gave up waiting for a response.
    #[error("Request timed out")]
    Timeout,

    /// The response body could not be decoded into the requested type.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// The client was configured with an unusable value (missing API key,
    /// header-unsafe characters, and so on).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The base URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns the HTTP status code if this error has one.
    ///
    /// ```
    /// use lotr::Error;
    /// use http::StatusCode;
    ///
    /// let err = Error::ServerError {
    ///     status: StatusCode::SERVICE_UNAVAILABLE,
    ///     raw_response: "down".to_string(),
    /// };
    /// assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    /// assert_eq!(Error::Timeout.status(), None);
    /// ```
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::ServerError { status, .. } => Some(*status),
            Error::ClientError { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::ServerError { raw_response, .. } => Some(raw_response),
            Error::ClientError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns `true` if the call ended on a `429 Too Many Requests`.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::ClientError { status, .. } if *status == StatusCode::TOO_MANY_REQUESTS)
    }
}

/// A specialized `Result` type for One API calls.
pub type Result<T> = std::result::Result<T, Error>;
