//! Items: tracked products with an ideal and a current stock level.
//!
//! Stock never goes below zero; the clamping happens inside the UPDATE so a
//! concurrent consume cannot drive the level negative.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub ideal_quantity: i64,
    pub current_quantity: i64,
    pub magasin_id: i64,
}

impl Item {
    /// An item belongs on the shopping list while stock is below the ideal.
    pub fn needs_shopping(&self) -> bool {
        self.current_quantity < self.ideal_quantity
    }
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub name: Option<String>,
    pub ideal_quantity: Option<i64>,
    pub current_quantity: Option<i64>,
}

/// Items of one magasin, alphabetically.
pub async fn list_for_magasin(pool: &SqlitePool, magasin_id: i64) -> Result<Vec<Item>> {
    let items = sqlx::query_as::<_, Item>(
        "SELECT id, name, ideal_quantity, current_quantity, magasin_id FROM items \
         WHERE magasin_id = ? ORDER BY name ASC",
    )
    .bind(magasin_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Insert an item. New items start out of stock.
pub async fn add(
    pool: &SqlitePool,
    magasin_id: i64,
    name: &str,
    ideal_quantity: i64,
) -> Result<Item> {
    let item = sqlx::query_as::<_, Item>(
        "INSERT INTO items (name, ideal_quantity, current_quantity, magasin_id) \
         VALUES (?, ?, 0, ?) \
         RETURNING id, name, ideal_quantity, current_quantity, magasin_id",
    )
    .bind(name)
    .bind(ideal_quantity)
    .bind(magasin_id)
    .fetch_one(pool)
    .await?;
    Ok(item)
}

pub async fn find_in_magasin(
    pool: &SqlitePool,
    magasin_id: i64,
    item_id: i64,
) -> Result<Option<Item>> {
    let item = sqlx::query_as::<_, Item>(
        "SELECT id, name, ideal_quantity, current_quantity, magasin_id FROM items \
         WHERE id = ? AND magasin_id = ?",
    )
    .bind(item_id)
    .bind(magasin_id)
    .fetch_optional(pool)
    .await?;
    Ok(item)
}

/// Apply a partial update to an item of the given magasin. Returns `None`
/// when no such item exists there.
pub async fn update(
    pool: &SqlitePool,
    magasin_id: i64,
    item_id: i64,
    patch: &ItemPatch,
) -> Result<Option<Item>> {
    let item = sqlx::query_as::<_, Item>(
        "UPDATE items SET \
            name = COALESCE(?, name), \
            ideal_quantity = COALESCE(?, ideal_quantity), \
            current_quantity = COALESCE(?, current_quantity) \
         WHERE id = ? AND magasin_id = ? \
         RETURNING id, name, ideal_quantity, current_quantity, magasin_id",
    )
    .bind(patch.name.as_deref())
    .bind(patch.ideal_quantity)
    .bind(patch.current_quantity)
    .bind(item_id)
    .bind(magasin_id)
    .fetch_optional(pool)
    .await?;
    Ok(item)
}

pub async fn delete(pool: &SqlitePool, item_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM items WHERE id = ?")
        .bind(item_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Decrease the stock level by `quantity`, clamped at zero.
pub async fn consume(
    pool: &SqlitePool,
    magasin_id: i64,
    item_id: i64,
    quantity: i64,
) -> Result<Option<Item>> {
    let item = sqlx::query_as::<_, Item>(
        "UPDATE items SET current_quantity = MAX(0, current_quantity - ?) \
         WHERE id = ? AND magasin_id = ? \
         RETURNING id, name, ideal_quantity, current_quantity, magasin_id",
    )
    .bind(quantity)
    .bind(item_id)
    .bind(magasin_id)
    .fetch_optional(pool)
    .await?;
    Ok(item)
}

/// Set the stock level to `quantity` (clamped at zero), or back to the
/// ideal level when no quantity is given.
pub async fn restock(
    pool: &SqlitePool,
    magasin_id: i64,
    item_id: i64,
    quantity: Option<i64>,
) -> Result<Option<Item>> {
    let item = match quantity {
        Some(quantity) => {
            sqlx::query_as::<_, Item>(
                "UPDATE items SET current_quantity = MAX(0, ?) \
                 WHERE id = ? AND magasin_id = ? \
                 RETURNING id, name, ideal_quantity, current_quantity, magasin_id",
            )
            .bind(quantity)
            .bind(item_id)
            .bind(magasin_id)
            .fetch_optional(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Item>(
                "UPDATE items SET current_quantity = ideal_quantity \
                 WHERE id = ? AND magasin_id = ? \
                 RETURNING id, name, ideal_quantity, current_quantity, magasin_id",
            )
            .bind(item_id)
            .bind(magasin_id)
            .fetch_optional(pool)
            .await?
        }
    };
    Ok(item)
}
