//! Item routes: stock levels within one magasin, plus the shared-catalog
//! search used for suggestions.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::handlers::{AppJson, magasin_scope, parse_id, Success};
use crate::state::AppState;
use store::items::{Item, ItemPatch};
use store::lists::SharedItem;

/// Items of a magasin plus a short magasin header, the `GET …/items` shape.
#[derive(Debug, Serialize)]
pub struct MagasinItems {
    magasin: MagasinHeader,
    items: Vec<Item>,
}

#[derive(Debug, Serialize)]
struct MagasinHeader {
    id: i64,
    name: String,
    emoji: String,
}

/// `GET /boutique/:code/magasins/:id/items`
pub async fn index(
    State(state): State<AppState>,
    Path((code, id)): Path<(String, String)>,
) -> Result<Json<MagasinItems>> {
    let magasin_id = parse_id(&id);
    if code.trim().is_empty() || magasin_id == 0 {
        return Err(Error::bad_request("Code boutique et ID magasin requis"));
    }

    let (_, magasin) = magasin_scope(&state.pool, &code, magasin_id).await?;
    let items = store::items::list_for_magasin(&state.pool, magasin.id).await?;
    Ok(Json(MagasinItems {
        magasin: MagasinHeader {
            id: magasin.id,
            name: magasin.name,
            emoji: magasin.emoji,
        },
        items,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItem {
    name: Option<String>,
    ideal_quantity: Option<i64>,
}

/// `POST /boutique/:code/magasins/:id/items/add`
pub async fn add(
    State(state): State<AppState>,
    Path((code, id)): Path<(String, String)>,
    AppJson(body): AppJson<AddItem>,
) -> Result<Json<Item>> {
    let magasin_id = parse_id(&id);
    if code.trim().is_empty() || magasin_id == 0 {
        return Err(Error::bad_request("Code boutique et ID magasin requis"));
    }
    let name = match body.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(Error::bad_request("Le nom de l'article est requis")),
    };

    let (_, magasin) = magasin_scope(&state.pool, &code, magasin_id).await?;
    let item = store::items::add(
        &state.pool,
        magasin.id,
        &name,
        body.ideal_quantity.unwrap_or(1),
    )
    .await?;
    Ok(Json(item))
}

/// `PUT /boutique/:code/magasins/:id/items/:item_id`
pub async fn update(
    State(state): State<AppState>,
    Path((code, id, item_id)): Path<(String, String, String)>,
    AppJson(body): AppJson<ItemPatch>,
) -> Result<Json<Item>> {
    let (magasin_id, item_id) = (parse_id(&id), parse_id(&item_id));
    if code.trim().is_empty() || magasin_id == 0 || item_id == 0 {
        return Err(Error::bad_request(
            "Code boutique, ID magasin et ID item requis",
        ));
    }

    let mut patch = body;
    if let Some(name) = patch.name.take() {
        patch.name = Some(name.trim().to_string());
    }

    let (_, magasin) = magasin_scope(&state.pool, &code, magasin_id).await?;
    let item = store::items::update(&state.pool, magasin.id, item_id, &patch)
        .await?
        .ok_or_else(|| Error::not_found("Article non trouvé"))?;
    Ok(Json(item))
}

/// `DELETE /boutique/:code/magasins/:id/items/:item_id`
pub async fn remove(
    State(state): State<AppState>,
    Path((code, id, item_id)): Path<(String, String, String)>,
) -> Result<Json<Success>> {
    let (magasin_id, item_id) = (parse_id(&id), parse_id(&item_id));
    if code.trim().is_empty() || magasin_id == 0 || item_id == 0 {
        return Err(Error::bad_request(
            "Code boutique, ID magasin et ID item requis",
        ));
    }

    let (_, magasin) = magasin_scope(&state.pool, &code, magasin_id).await?;
    let item = store::items::find_in_magasin(&state.pool, magasin.id, item_id)
        .await?
        .ok_or_else(|| Error::not_found("Article non trouvé"))?;
    store::items::delete(&state.pool, item.id).await?;
    Ok(Json(Success::ok()))
}

#[derive(Debug, Default, Deserialize)]
pub struct QuantityBody {
    quantity: Option<i64>,
}

/// `POST …/consume`. Drops stock by the given quantity (default one unit),
/// clamped at zero. The body is optional.
pub async fn consume(
    State(state): State<AppState>,
    Path((code, id, item_id)): Path<(String, String, String)>,
    body: Option<Json<QuantityBody>>,
) -> Result<Json<Item>> {
    let (magasin_id, item_id) = (parse_id(&id), parse_id(&item_id));
    if code.trim().is_empty() || magasin_id == 0 || item_id == 0 {
        return Err(Error::bad_request(
            "Code boutique, ID magasin et ID item requis",
        ));
    }
    let quantity = body.and_then(|Json(b)| b.quantity).unwrap_or(1);

    let (_, magasin) = magasin_scope(&state.pool, &code, magasin_id).await?;
    let item = store::items::consume(&state.pool, magasin.id, item_id, quantity)
        .await?
        .ok_or_else(|| Error::not_found("Article non trouvé"))?;
    Ok(Json(item))
}

/// `POST …/restock`. Sets stock to the given quantity (clamped at zero),
/// or back to the ideal level when the body carries none.
pub async fn restock(
    State(state): State<AppState>,
    Path((code, id, item_id)): Path<(String, String, String)>,
    body: Option<Json<QuantityBody>>,
) -> Result<Json<Item>> {
    let (magasin_id, item_id) = (parse_id(&id), parse_id(&item_id));
    if code.trim().is_empty() || magasin_id == 0 || item_id == 0 {
        return Err(Error::bad_request(
            "Code boutique, ID magasin et ID item requis",
        ));
    }
    let quantity = body.and_then(|Json(b)| b.quantity);

    let (_, magasin) = magasin_scope(&state.pool, &code, magasin_id).await?;
    let item = store::items::restock(&state.pool, magasin.id, item_id, quantity)
        .await?
        .ok_or_else(|| Error::not_found("Article non trouvé"))?;
    Ok(Json(item))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    search: Option<String>,
}

/// `GET /items?search=`. Shared-catalog suggestions, capped at 20.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SharedItem>>> {
    let term = query.search.unwrap_or_default();
    let items = store::lists::search_shared(&state.pool, &term).await?;
    Ok(Json(items))
}
