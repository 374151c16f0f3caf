//! # Store — SQLite persistence for boutiques and shared shopping lists
//!
//! Everything stateful lives here. The schema is embedded as migrations and
//! applied through [`migrate`], so a pool opened with [`connect`] is all a
//! caller needs. Modules map one-to-one onto the domain:
//!
//! | Module | Tables | Description |
//! |--------|--------|-------------|
//! | [`boutiques`] | `boutiques` | Tenants addressed by a six-digit code. |
//! | [`magasins`] | `magasins` | Ordered subdivisions of a boutique. |
//! | [`items`] | `items` | Stock levels tracked per magasin. |
//! | [`lists`] | `shopping_lists`, `shared_items`, `shopping_list_items` | Shared lists over a deduplicated item catalog. |
//!
//! All queries take a `&SqlitePool` and return [`Result`]. Uniqueness
//! violations the domain cares about get their own [`StoreError`] variants;
//! everything else surfaces as [`StoreError::Database`].

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

pub mod boutiques;
pub mod items;
pub mod lists;
pub mod magasins;

pub use boutiques::{Boutique, BoutiqueDetail};
pub use items::{Item, ItemPatch};
pub use lists::{ListEntry, ListEntryDetail, SharedItem, ShoppingList, ShoppingListDetail};
pub use magasins::{Magasin, MagasinDetail};

/// Schema migrations, embedded at compile time.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Error)]
pub enum StoreError {
    /// A boutique with the same access code already exists.
    #[error("access code already in use")]
    CodeTaken,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Open a pool on `url`, creating the database file if needed.
///
/// Foreign keys are enabled on every connection so the `ON DELETE CASCADE`
/// rules in the schema actually fire.
pub async fn connect(url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // An in-memory database lives and dies with its connection; a single
    // connection keeps every statement on the same database.
    let max_connections = if url.contains(":memory:") || url.contains("mode=memory") {
        1
    } else {
        5
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Apply pending migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    tracing::debug!("migrations up to date");
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = connect("sqlite::memory:").await.unwrap();
    migrate(&pool).await.unwrap();
    pool
}
