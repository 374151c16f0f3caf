//! Boutiques: top-level tenants addressed by their six-digit access code.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::magasins::{self, MagasinDetail};
use crate::{Result, StoreError};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Boutique {
    pub id: i64,
    pub name: String,
    pub code: String,
}

/// A boutique with its magasins, each carrying items and derived counts.
/// This is the shape the code-addressed detail endpoint returns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoutiqueDetail {
    #[serde(flatten)]
    pub boutique: Boutique,
    pub magasins: Vec<MagasinDetail>,
}

/// Insert a boutique. The access code is unique; a collision maps to
/// [`StoreError::CodeTaken`].
pub async fn create(pool: &SqlitePool, name: &str, code: &str) -> Result<Boutique> {
    let created = sqlx::query_as::<_, Boutique>(
        "INSERT INTO boutiques (name, code) VALUES (?, ?) RETURNING id, name, code",
    )
    .bind(name)
    .bind(code)
    .fetch_one(pool)
    .await;

    match created {
        Ok(boutique) => Ok(boutique),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::CodeTaken),
        Err(e) => Err(e.into()),
    }
}

pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Boutique>> {
    let boutique = sqlx::query_as::<_, Boutique>(
        "SELECT id, name, code FROM boutiques WHERE code = ?",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?;
    Ok(boutique)
}

/// Load a boutique with its magasins in position order, each annotated with
/// its items and shopping counts.
pub async fn detail(pool: &SqlitePool, code: &str) -> Result<Option<BoutiqueDetail>> {
    let Some(boutique) = find_by_code(pool, code).await? else {
        return Ok(None);
    };
    let magasins = magasins::list_with_items(pool, boutique.id).await?;
    Ok(Some(BoutiqueDetail { boutique, magasins }))
}
