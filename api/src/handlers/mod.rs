//! Request handlers, one module per resource.

pub mod auth;
pub mod boutiques;
pub mod items;
pub mod lists;
pub mod magasins;

use axum::extract::{FromRequest, Request};
use axum::{async_trait, Json};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::{Error, Result};
use store::boutiques::Boutique;
use store::magasins::Magasin;

/// Body of the delete-style endpoints.
#[derive(Debug, Serialize)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub(crate) fn ok() -> Self {
        Self { success: true }
    }
}

/// [`axum::Json`] with the rejection mapped into [`Error`], so a malformed
/// or missing body answers the same `{statusCode, message}` envelope as
/// every other failure.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(_) => Err(Error::bad_request("Corps de requête invalide")),
        }
    }
}

/// Route ids arrive as raw path segments. Parsing is strict: anything that
/// is not a whole number, trailing garbage included ("12abc"), maps to 0,
/// which the calling handler rejects as missing.
pub(crate) fn parse_id(raw: &str) -> i64 {
    raw.parse().unwrap_or(0)
}

pub(crate) async fn boutique_by_code(pool: &SqlitePool, code: &str) -> Result<Boutique> {
    store::boutiques::find_by_code(pool, code)
        .await?
        .ok_or_else(|| Error::not_found("Boutique non trouvée"))
}

/// Resolve the boutique and one of its magasins, rejecting magasin ids that
/// live under a different boutique.
pub(crate) async fn magasin_scope(
    pool: &SqlitePool,
    code: &str,
    magasin_id: i64,
) -> Result<(Boutique, Magasin)> {
    let boutique = boutique_by_code(pool, code).await?;
    let magasin = store::magasins::find_in_boutique(pool, boutique.id, magasin_id)
        .await?
        .ok_or_else(|| Error::not_found("Magasin non trouvé"))?;
    Ok((boutique, magasin))
}

#[cfg(test)]
mod tests {
    use super::parse_id;

    #[test]
    fn ids_parse_whole_or_map_to_zero() {
        assert_eq!(parse_id("12"), 12);
        assert_eq!(parse_id("-3"), -3);
        assert_eq!(parse_id("0"), 0);
        assert_eq!(parse_id(""), 0);
        assert_eq!(parse_id("abc"), 0);
        assert_eq!(parse_id("12abc"), 0);
    }
}
