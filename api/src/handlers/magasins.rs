//! Magasin routes: adding to and removing from a boutique.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::handlers::{AppJson, boutique_by_code, magasin_scope, parse_id, Success};
use crate::state::AppState;
use store::magasins::MagasinDetail;

#[derive(Debug, Default, Deserialize)]
pub struct AddMagasin {
    name: Option<String>,
    emoji: Option<String>,
}

/// `POST /boutique/:code/magasins/add`
pub async fn add(
    State(state): State<AppState>,
    Path(code): Path<String>,
    AppJson(body): AppJson<AddMagasin>,
) -> Result<Json<MagasinDetail>> {
    if code.trim().is_empty() {
        return Err(Error::bad_request("Code boutique requis"));
    }
    let name = match body.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(Error::bad_request("Le nom du magasin est requis")),
    };
    let emoji = match body.emoji {
        Some(emoji) if !emoji.is_empty() => emoji,
        _ => "🛒".to_string(),
    };

    let boutique = boutique_by_code(&state.pool, &code).await?;
    let magasin = store::magasins::add(&state.pool, boutique.id, &name, &emoji).await?;
    // A fresh magasin has no items yet; no need to go back to the database
    // for counts.
    Ok(Json(MagasinDetail::new(magasin, Vec::new())))
}

/// `DELETE /boutique/:code/magasins/:id`
pub async fn remove(
    State(state): State<AppState>,
    Path((code, id)): Path<(String, String)>,
) -> Result<Json<Success>> {
    if code.trim().is_empty() {
        return Err(Error::bad_request("Code boutique requis"));
    }
    let magasin_id = parse_id(&id);
    if magasin_id == 0 {
        return Err(Error::bad_request("ID magasin requis"));
    }

    let (_, magasin) = magasin_scope(&state.pool, &code, magasin_id).await?;
    store::magasins::delete(&state.pool, magasin.id).await?;
    Ok(Json(Success::ok()))
}
