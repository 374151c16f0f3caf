//! Shared shopping lists: named lists of checkable entries over a
//! deduplicated item catalog.
//!
//! Item names are normalized (trimmed, lowercased) before they touch the
//! catalog, so "Lait", " lait " and "LAIT" are the same shared item. A list
//! holds at most one entry per shared item; re-adding bumps the quantity
//! and unchecks the entry. Both upserts ride on UNIQUE constraints instead
//! of a read-then-insert, so concurrent adds collapse into one row.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::Result;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalog entry. Names are stored normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SharedItem {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    pub id: i64,
    pub quantity: i64,
    pub checked: bool,
    pub shopping_list_id: i64,
    pub item_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A list entry joined to its shared item, the shape the list endpoints
/// return.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntryDetail {
    #[serde(flatten)]
    pub entry: ListEntry,
    pub item: SharedItem,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListDetail {
    #[serde(flatten)]
    pub list: ShoppingList,
    pub items: Vec<ListEntryDetail>,
}

/// Canonical form of a shared item name.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub async fn create(pool: &SqlitePool, name: &str) -> Result<ShoppingList> {
    let now = Utc::now();
    let list = sqlx::query_as::<_, ShoppingList>(
        "INSERT INTO shopping_lists (name, created_at, updated_at) VALUES (?, ?, ?) \
         RETURNING id, name, created_at, updated_at",
    )
    .bind(name)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(list)
}

/// Every list, most recently updated first, each with its entries.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<ShoppingListDetail>> {
    let lists = sqlx::query_as::<_, ShoppingList>(
        "SELECT id, name, created_at, updated_at FROM shopping_lists \
         ORDER BY updated_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    let mut details = Vec::with_capacity(lists.len());
    for list in lists {
        let items = entries(pool, list.id).await?;
        details.push(ShoppingListDetail { list, items });
    }
    Ok(details)
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    id: i64,
    quantity: i64,
    checked: bool,
    shopping_list_id: i64,
    item_id: i64,
    created_at: DateTime<Utc>,
    item_name: String,
}

impl From<EntryRow> for ListEntryDetail {
    fn from(row: EntryRow) -> Self {
        ListEntryDetail {
            entry: ListEntry {
                id: row.id,
                quantity: row.quantity,
                checked: row.checked,
                shopping_list_id: row.shopping_list_id,
                item_id: row.item_id,
                created_at: row.created_at,
            },
            item: SharedItem {
                id: row.item_id,
                name: row.item_name,
            },
        }
    }
}

/// Entries of one list: unchecked first, then newest first.
pub async fn entries(pool: &SqlitePool, list_id: i64) -> Result<Vec<ListEntryDetail>> {
    let rows = sqlx::query_as::<_, EntryRow>(
        "SELECT e.id, e.quantity, e.checked, e.shopping_list_id, e.item_id, e.created_at, \
                i.name AS item_name \
         FROM shopping_list_items e \
         JOIN shared_items i ON i.id = e.item_id \
         WHERE e.shopping_list_id = ? \
         ORDER BY e.checked ASC, e.created_at DESC, e.id DESC",
    )
    .bind(list_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(ListEntryDetail::from).collect())
}

async fn entry_detail(pool: &SqlitePool, entry_id: i64) -> Result<Option<ListEntryDetail>> {
    let row = sqlx::query_as::<_, EntryRow>(
        "SELECT e.id, e.quantity, e.checked, e.shopping_list_id, e.item_id, e.created_at, \
                i.name AS item_name \
         FROM shopping_list_items e \
         JOIN shared_items i ON i.id = e.item_id \
         WHERE e.id = ?",
    )
    .bind(entry_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(ListEntryDetail::from))
}

/// Find or create the shared item for `name` (already normalized).
async fn upsert_shared_item(pool: &SqlitePool, name: &str) -> Result<SharedItem> {
    let item = sqlx::query_as::<_, SharedItem>(
        "INSERT INTO shared_items (name) VALUES (?) \
         ON CONFLICT (name) DO UPDATE SET name = excluded.name \
         RETURNING id, name",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(item)
}

/// Add `name` to a list. The name is normalized, the shared item is found
/// or created, and an existing (list, item) entry absorbs the add: its
/// quantity grows by `quantity` and it comes back unchecked.
pub async fn add_entry(
    pool: &SqlitePool,
    list_id: i64,
    name: &str,
    quantity: i64,
) -> Result<ListEntryDetail> {
    let item = upsert_shared_item(pool, &normalize_name(name)).await?;

    let entry = sqlx::query_as::<_, ListEntry>(
        "INSERT INTO shopping_list_items (quantity, checked, shopping_list_id, item_id, created_at) \
         VALUES (?, 0, ?, ?, ?) \
         ON CONFLICT (shopping_list_id, item_id) \
         DO UPDATE SET quantity = quantity + excluded.quantity, checked = 0 \
         RETURNING id, quantity, checked, shopping_list_id, item_id, created_at",
    )
    .bind(quantity)
    .bind(list_id)
    .bind(item.id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(ListEntryDetail { entry, item })
}

/// Flip an entry's checked flag. Returns `None` for an unknown entry.
pub async fn toggle(pool: &SqlitePool, entry_id: i64) -> Result<Option<ListEntryDetail>> {
    let flipped = sqlx::query(
        "UPDATE shopping_list_items SET checked = NOT checked WHERE id = ?",
    )
    .bind(entry_id)
    .execute(pool)
    .await?;

    if flipped.rows_affected() == 0 {
        return Ok(None);
    }
    entry_detail(pool, entry_id).await
}

/// Delete an entry. Unknown ids are a no-op.
pub async fn remove_entry(pool: &SqlitePool, entry_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM shopping_list_items WHERE id = ?")
        .bind(entry_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Drop every checked entry of a list.
pub async fn clear_checked(pool: &SqlitePool, list_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM shopping_list_items WHERE shopping_list_id = ? AND checked = 1")
        .bind(list_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Substring search over the catalog, at most 20 results alphabetically.
/// An empty query matches everything. `%` and `_` in the query are plain
/// characters, not LIKE wildcards.
pub async fn search_shared(pool: &SqlitePool, query: &str) -> Result<Vec<SharedItem>> {
    let needle = normalize_name(query)
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let items = sqlx::query_as::<_, SharedItem>(
        "SELECT id, name FROM shared_items \
         WHERE name LIKE '%' || ? || '%' ESCAPE '\\' \
         ORDER BY name ASC LIMIT 20",
    )
    .bind(needle)
    .fetch_all(pool)
    .await?;
    Ok(items)
}
