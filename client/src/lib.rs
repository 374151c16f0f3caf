//! # Client crate — typed access to the shopping API
//!
//! Mirrors the two stateful views the web frontend keeps: [`BoutiqueState`]
//! (a boutique and its magasins) and [`MagasinState`] (one magasin with its
//! inventory and derived shopping list). Both hold an [`ApiClient`] and keep
//! their in-memory mirror in step with every mutation they send.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub mod boutique;
pub mod magasin;

pub use boutique::BoutiqueState;
pub use magasin::MagasinState;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server answered with its `{statusCode, message}` envelope.
    #[error("{message}")]
    Api { status_code: u16, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// User-facing message: the server's own, or the generic loading error.
    pub fn message(&self) -> String {
        match self {
            Error::Api { message, .. } => message.clone(),
            Error::Http(_) => "Erreur de chargement".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Thin JSON wrapper over [`reqwest::Client`] bound to one base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let response = self.http.get(self.url(path)).send().await?;
        decode(response).await
    }

    pub(crate) async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        decode(response).await
    }

    pub(crate) async fn put_json<T, B>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.http.put(self.url(path)).json(body).send().await?;
        decode(response).await
    }

    pub(crate) async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let response = self.http.delete(self.url(path)).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => "Erreur de chargement".into(),
    };
    Err(Error::Api {
        status_code: status.as_u16(),
        message,
    })
}
