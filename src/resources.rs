//! One method per resource path of The One API.
//!
//! Listing methods apply the client's paging, sort and filters. By-id methods
//! check the identifier first and fail with [`Error::InvalidIdentifier`]
//! without touching the network when it is not hexadecimal.
//!
//! All methods are generic over the decoded type; [`Page`](crate::Page) fits
//! every endpoint.

use crate::{transport::Transport, Client, Error, Response, Result};
use serde::de::DeserializeOwned;

/// `true` for a non-empty string of ASCII hex digits, the shape of the
/// API's document ids.
///
/// ```
/// assert!(lotr::is_valid_id("5cd95395de30eff6ebccde56"));
/// assert!(!lotr::is_valid_id("bad id"));
/// assert!(!lotr::is_valid_id(""));
/// ```
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_hexdigit())
}

fn checked_id(id: &str) -> Result<&str> {
    if is_valid_id(id) {
        Ok(id)
    } else {
        tracing::debug!(id = %id, "Rejecting invalid id");
        Err(Error::InvalidIdentifier(id.to_string()))
    }
}

impl<T: Transport> Client<T> {
    /// `GET /book`
    pub async fn get_books<Res: DeserializeOwned>(&self) -> Result<Response<Res>> {
        self.fetch("/book").await
    }

    /// `GET /book/{id}`
    pub async fn get_book<Res: DeserializeOwned>(&self, id: &str) -> Result<Response<Res>> {
        let id = checked_id(id)?;
        self.fetch(&format!("/book/{id}")).await
    }

    /// `GET /book/{id}chapter`
    ///
    /// Known quirk: the path has no `/` before `chapter`. Existing callers
    /// depend on the request going out exactly like this.
    // TODO: switch to `/book/{id}/chapter` once callers are checked against the live API.
    pub async fn get_book_chapters<Res: DeserializeOwned>(
        &self,
        id: &str,
    ) -> Result<Response<Res>> {
        let id = checked_id(id)?;
        self.fetch(&format!("/book/{id}chapter")).await
    }

    /// `GET /movie`
    pub async fn get_movies<Res: DeserializeOwned>(&self) -> Result<Response<Res>> {
        self.fetch("/movie").await
    }

    /// `GET /movie/{id}`
    pub async fn get_movie<Res: DeserializeOwned>(&self, id: &str) -> Result<Response<Res>> {
        let id = checked_id(id)?;
        self.fetch(&format!("/movie/{id}")).await
    }

    /// `GET /movie/{id}/quote`
    pub async fn get_movie_quotes<Res: DeserializeOwned>(
        &self,
        id: &str,
    ) -> Result<Response<Res>> {
        let id = checked_id(id)?;
        self.fetch(&format!("/movie/{id}/quote")).await
    }

    /// `GET /character`
    pub async fn get_characters<Res: DeserializeOwned>(&self) -> Result<Response<Res>> {
        self.fetch("/character").await
    }

    /// `GET /character/{id}`
    pub async fn get_character<Res: DeserializeOwned>(&self, id: &str) -> Result<Response<Res>> {
        let id = checked_id(id)?;
        self.fetch(&format!("/character/{id}")).await
    }

    /// `GET /character/{id}/quote`
    pub async fn get_character_quotes<Res: DeserializeOwned>(
        &self,
        id: &str,
    ) -> Result<Response<Res>> {
        let id = checked_id(id)?;
        self.fetch(&format!("/character/{id}/quote")).await
    }

    /// `GET /quote`
    pub async fn get_quotes<Res: DeserializeOwned>(&self) -> Result<Response<Res>> {
        self.fetch("/quote").await
    }

    /// `GET /quote/{id}`
    pub async fn get_quote<Res: DeserializeOwned>(&self, id: &str) -> Result<Response<Res>> {
        let id = checked_id(id)?;
        self.fetch(&format!("/quote/{id}")).await
    }

    /// `GET /chapter`
    pub async fn get_chapters<Res: DeserializeOwned>(&self) -> Result<Response<Res>> {
        self.fetch("/chapter").await
    }

    /// `GET /chapter/{id}`
    pub async fn get_chapter<Res: DeserializeOwned>(&self, id: &str) -> Result<Response<Res>> {
        let id = checked_id(id)?;
        self.fetch(&format!("/chapter/{id}")).await
    }
}
