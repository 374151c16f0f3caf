//! Magasins: named subdivisions of a boutique, kept in position order.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::SqlitePool;

use crate::items::Item;
use crate::Result;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Magasin {
    pub id: i64,
    pub name: String,
    pub emoji: String,
    pub position: i64,
    pub boutique_id: i64,
}

/// A magasin with its items and the two derived counts: how many items it
/// tracks and how many are currently below their ideal level.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MagasinDetail {
    #[serde(flatten)]
    pub magasin: Magasin,
    pub items: Vec<Item>,
    pub items_count: usize,
    pub shopping_count: usize,
}

impl MagasinDetail {
    pub fn new(magasin: Magasin, items: Vec<Item>) -> Self {
        let items_count = items.len();
        let shopping_count = items.iter().filter(|i| i.needs_shopping()).count();
        Self {
            magasin,
            items,
            items_count,
            shopping_count,
        }
    }
}

/// Insert a magasin at the end of the boutique: its position is the current
/// magasin count, so creation order is display order.
pub async fn add(pool: &SqlitePool, boutique_id: i64, name: &str, emoji: &str) -> Result<Magasin> {
    let (position,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM magasins WHERE boutique_id = ?")
            .bind(boutique_id)
            .fetch_one(pool)
            .await?;

    let magasin = sqlx::query_as::<_, Magasin>(
        "INSERT INTO magasins (name, emoji, position, boutique_id) VALUES (?, ?, ?, ?) \
         RETURNING id, name, emoji, position, boutique_id",
    )
    .bind(name)
    .bind(emoji)
    .bind(position)
    .bind(boutique_id)
    .fetch_one(pool)
    .await?;
    Ok(magasin)
}

/// Look a magasin up within one boutique. A magasin id belonging to another
/// boutique yields `None`.
pub async fn find_in_boutique(
    pool: &SqlitePool,
    boutique_id: i64,
    magasin_id: i64,
) -> Result<Option<Magasin>> {
    let magasin = sqlx::query_as::<_, Magasin>(
        "SELECT id, name, emoji, position, boutique_id FROM magasins \
         WHERE id = ? AND boutique_id = ?",
    )
    .bind(magasin_id)
    .bind(boutique_id)
    .fetch_optional(pool)
    .await?;
    Ok(magasin)
}

/// All magasins of a boutique in position order, each with its items.
pub async fn list_with_items(pool: &SqlitePool, boutique_id: i64) -> Result<Vec<MagasinDetail>> {
    let magasins = sqlx::query_as::<_, Magasin>(
        "SELECT id, name, emoji, position, boutique_id FROM magasins \
         WHERE boutique_id = ? ORDER BY position ASC",
    )
    .bind(boutique_id)
    .fetch_all(pool)
    .await?;

    let items = sqlx::query_as::<_, Item>(
        "SELECT i.id, i.name, i.ideal_quantity, i.current_quantity, i.magasin_id \
         FROM items i JOIN magasins m ON m.id = i.magasin_id \
         WHERE m.boutique_id = ? ORDER BY i.name ASC",
    )
    .bind(boutique_id)
    .fetch_all(pool)
    .await?;

    let mut by_magasin: HashMap<i64, Vec<Item>> = HashMap::new();
    for item in items {
        by_magasin.entry(item.magasin_id).or_default().push(item);
    }

    Ok(magasins
        .into_iter()
        .map(|magasin| {
            let items = by_magasin.remove(&magasin.id).unwrap_or_default();
            MagasinDetail::new(magasin, items)
        })
        .collect())
}

/// Delete a magasin; its items go with it.
pub async fn delete(pool: &SqlitePool, magasin_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM magasins WHERE id = ?")
        .bind(magasin_id)
        .execute(pool)
        .await?;
    Ok(())
}
