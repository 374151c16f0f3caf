//! Shared shopping-list routes.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::handlers::{AppJson, parse_id, Success};
use crate::state::AppState;
use store::lists::{ListEntryDetail, ShoppingListDetail};

/// `GET /lists`
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ShoppingListDetail>>> {
    Ok(Json(store::lists::list_all(&state.pool).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateList {
    name: Option<String>,
}

/// `POST /lists`. The body is optional; unnamed lists become "Ma liste".
pub async fn create(
    State(state): State<AppState>,
    body: Option<Json<CreateList>>,
) -> Result<Json<ShoppingListDetail>> {
    let name = match body.and_then(|Json(b)| b.name) {
        Some(name) if !name.is_empty() => name,
        _ => "Ma liste".to_string(),
    };
    let list = store::lists::create(&state.pool, &name).await?;
    Ok(Json(ShoppingListDetail {
        list,
        items: Vec::new(),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddListItem {
    item_name: Option<String>,
    quantity: Option<i64>,
}

/// `POST /lists/:id/add-item`
pub async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(body): AppJson<AddListItem>,
) -> Result<Json<ListEntryDetail>> {
    let list_id = parse_id(&id);
    let name = match body.item_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(Error::bad_request("Nom de l'item requis")),
    };

    let entry =
        store::lists::add_entry(&state.pool, list_id, &name, body.quantity.unwrap_or(1)).await?;
    Ok(Json(entry))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRef {
    item_id: Option<i64>,
}

/// `POST /lists/:id/toggle-item`. The id in the body is the list entry id,
/// not the shared item id.
pub async fn toggle_item(
    State(state): State<AppState>,
    Path(_id): Path<String>,
    AppJson(body): AppJson<EntryRef>,
) -> Result<Json<ListEntryDetail>> {
    let Some(entry_id) = body.item_id else {
        return Err(Error::bad_request("ID item requis"));
    };
    let entry = store::lists::toggle(&state.pool, entry_id)
        .await?
        .ok_or_else(|| Error::not_found("Item non trouve"))?;
    Ok(Json(entry))
}

/// `POST /lists/:id/remove-item`. Removing an unknown entry still succeeds.
pub async fn remove_item(
    State(state): State<AppState>,
    Path(_id): Path<String>,
    AppJson(body): AppJson<EntryRef>,
) -> Result<Json<Success>> {
    let Some(entry_id) = body.item_id else {
        return Err(Error::bad_request("ID item requis"));
    };
    store::lists::remove_entry(&state.pool, entry_id).await?;
    Ok(Json(Success::ok()))
}

/// `POST /lists/:id/clear-checked`
pub async fn clear_checked(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Success>> {
    store::lists::clear_checked(&state.pool, parse_id(&id)).await?;
    Ok(Json(Success::ok()))
}
