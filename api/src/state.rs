//! Shared application state handed to every handler.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::Identity;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub identity: Arc<Identity>,
}

impl AppState {
    pub fn new(pool: SqlitePool, identity: Arc<Identity>) -> Self {
        Self { pool, identity }
    }
}
