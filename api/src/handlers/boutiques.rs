//! Boutique routes: creation and the code-addressed detail view.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::handlers::AppJson;
use crate::state::AppState;
use store::boutiques::{Boutique, BoutiqueDetail};

#[derive(Debug, Default, Deserialize)]
pub struct CreateBoutique {
    name: Option<String>,
    code: Option<String>,
}

/// `POST /boutique/create`
pub async fn create(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateBoutique>,
) -> Result<Json<Boutique>> {
    let name = match body.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(Error::bad_request("Le nom de la boutique est requis")),
    };

    let code = body.code.unwrap_or_default();
    if !is_valid_code(&code) {
        return Err(Error::bad_request(
            "Le code PIN doit contenir exactement 6 chiffres",
        ));
    }

    let boutique = store::boutiques::create(&state.pool, &name, &code).await?;
    Ok(Json(boutique))
}

/// The access code is a six-digit PIN.
fn is_valid_code(code: &str) -> bool {
    code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit())
}

/// `GET /boutique/:code`
pub async fn show(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<BoutiqueDetail>> {
    if code.trim().is_empty() {
        return Err(Error::bad_request("Code boutique requis"));
    }
    let detail = store::boutiques::detail(&state.pool, &code)
        .await?
        .ok_or_else(|| Error::not_found("Boutique non trouvée"))?;
    Ok(Json(detail))
}
