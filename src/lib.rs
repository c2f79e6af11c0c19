//! # lotr - a client for The One API
//!
//! `lotr` wraps the read-only REST API at <https://the-one-api.dev> (books,
//! movies, characters, quotes and chapters of The Lord of the Rings). It turns
//! paging, sorting and filtering into the API's query syntax, sends each
//! request with your bearer token, and retries transient failures.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lotr::{Client, FilterDescriptor, FilterOperator, Page};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Character {
//!     name: String,
//!     race: Option<String>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lotr::Error> {
//!     let mut client = Client::new("my-api-key")?;
//!
//!     client.set_limit(3);
//!     client.set_filters(vec![
//!         FilterDescriptor::new("race", FilterOperator::Include, "Hobbit,Human"),
//!         FilterDescriptor::new("hair", FilterOperator::NotMatch, "Blonde"),
//!         FilterDescriptor::new("name", FilterOperator::RegexMatch, "king"),
//!     ]);
//!
//!     // GET /character?limit=3&race=Hobbit,Human&hair!=Blonde&name=/king/i
//!     let characters = client.get_characters::<Page<Character>>().await?;
//!     for character in &characters.docs {
//!         println!("{} ({:?})", character.name, character.race);
//!     }
//!     println!("page {:?} of {:?}", characters.page, characters.pages);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Session state
//!
//! Paging, sort and filters are set on the client and sent with every
//! following request until changed. Setters never fail: out-of-range values
//! are ignored and the previous value is kept. Filters that cannot be
//! expressed (for instance `<` with a non-numeric value) are left out of the
//! query rather than failing the request.
//!
//! ## Retries
//!
//! - `429 Too Many Requests` is retried under the rate-limit policy
//!   (default: 10 retries, 10 s apart).
//! - Other 4xx responses, and 429 once that policy is spent, are retried under
//!   the generic policy (default: 3 retries, 5 s apart).
//! - 5xx responses fail immediately with [`Error::ServerError`].
//!
//! ```no_run
//! use lotr::{Client, RetryPolicy};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), lotr::Error> {
//! let client = Client::builder()
//!     .api_key("my-api-key")
//!     .rate_limit_policy(RetryPolicy::new(3, Duration::from_secs(60)))
//!     .retry_policy(RetryPolicy::none())
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The client emits structured events through `tracing` (attempts, statuses,
//! scheduled retries, dropped filters). Install any subscriber to see them.

mod client;
mod error;
pub mod filter;
pub mod query;
mod resources;
mod response;
pub mod retry;
pub mod transport;

pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL};
pub use error::{Error, Result};
pub use filter::{FilterDescriptor, FilterOperator, FilterValue};
pub use query::{PagingState, QueryOptions, SortDirection, SortSpec};
pub use resources::is_valid_id;
pub use response::{Page, Response};
pub use retry::{RetryPolicies, RetryPolicy};
