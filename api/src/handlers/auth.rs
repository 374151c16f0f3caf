//! Session routes over the process-wide identity context.

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::Json;
use serde::Deserialize;

use crate::auth::AuthSnapshot;
use crate::error::{Error, Result};
use crate::state::AppState;

/// `GET /auth/me`. Settles the session context (at most once) and reports it.
pub async fn me(State(state): State<AppState>) -> Json<AuthSnapshot> {
    Json(state.identity.initialize().await)
}

/// `GET /auth/login`. Starts an interactive login at the provider.
pub async fn login(State(state): State<AppState>) -> Result<Redirect> {
    match state.identity.login().await {
        Ok(url) => Ok(Redirect::temporary(&url)),
        Err(error) => {
            tracing::warn!(%error, "login unavailable");
            Err(Error::Unavailable("Authentification indisponible".into()))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
}

/// `GET /auth/callback`. Finishes the login started by [`login`].
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect> {
    let (Some(code), Some(login_state)) = (query.code, query.state) else {
        return Err(Error::bad_request("Paramètres de connexion requis"));
    };

    if let Err(error) = state.identity.complete_login(&login_state, &code).await {
        tracing::warn!(%error, "login callback rejected");
        return Err(Error::bad_request("Connexion impossible"));
    }
    Ok(Redirect::temporary("/"))
}

/// `POST /auth/logout`. Drops the session, then sends the user to the portal
/// (through the provider's end-session endpoint when available).
pub async fn logout(State(state): State<AppState>) -> Redirect {
    let url = state.identity.logout().await;
    Redirect::temporary(&url)
}

/// `GET /auth/portal`. The shared landing page.
pub async fn portal(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(state.identity.portal_url())
}
