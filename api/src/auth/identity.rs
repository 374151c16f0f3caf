//! # Identity — process-wide session context over OpenID Connect
//!
//! One [`Identity`] value is shared by every request. It settles exactly
//! once per process and every route reads the same snapshot afterwards.
//!
//! ## Flow
//!
//! 1. **[`initialize`](Identity::initialize)** runs the session check at
//!    most once; later and concurrent callers await the same outcome.
//!    Without an issuer the context settles unauthenticated on the spot.
//!    With one, the provider is discovered and a configured refresh token
//!    is redeemed as a silent session check. Failures are logged and
//!    settle the context unauthenticated; they never propagate.
//! 2. **[`login`](Identity::login)** builds an authorization URL with a
//!    fresh PKCE challenge (S256) and persists state, verifier and nonce
//!    in the `auth_states` table with a 10-minute expiry.
//! 3. **[`complete_login`](Identity::complete_login)** consumes the
//!    matching `auth_states` row (state match and expiry validated in one
//!    query), exchanges the code, verifies the ID token against the stored
//!    nonce and publishes the authenticated snapshot.
//! 4. **[`logout`](Identity::logout)** clears the snapshot and returns
//!    the provider's end-session URL pointing back at the portal, or the
//!    portal itself when the provider never came up.
//!
//! Access is a realm-role check: `superadmin` or the configured role.

use chrono::{Duration, Utc};
use openidconnect::core::CoreAuthenticationFlow;
use openidconnect::reqwest::async_http_client;
use openidconnect::{
    AuthorizationCode, ClientId, CsrfToken, EndSessionUrl, IssuerUrl, LogoutRequest, Nonce,
    PkceCodeChallenge, PkceCodeVerifier, PostLogoutRedirectUrl, ProviderMetadataWithLogout,
    RedirectUrl, RefreshToken, TokenResponse,
};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::{OnceCell, RwLock};

use super::claims::{KeycloakClient, KeycloakIdTokenClaims};
use super::config::IdentityConfig;

/// Realm role that bypasses the configured access role.
pub const SUPERADMIN_ROLE: &str = "superadmin";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity provider is not configured")]
    NotConfigured,
    #[error("invalid identity configuration: {0}")]
    Config(String),
    #[error("provider discovery failed: {0}")]
    Discovery(String),
    #[error("token exchange failed: {0}")]
    Exchange(String),
    #[error("token response carried no ID token")]
    MissingIdToken,
    #[error("unknown or expired login state")]
    UnknownState,
    #[error(transparent)]
    Verification(#[from] openidconnect::ClaimsVerificationError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub name: String,
    pub email: String,
}

/// Point-in-time view of the session, the `/auth/me` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSnapshot {
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub has_access: bool,
    pub user: Option<AuthUser>,
}

impl AuthSnapshot {
    fn loading() -> Self {
        Self {
            is_loading: true,
            is_authenticated: false,
            has_access: false,
            user: None,
        }
    }

    fn unauthenticated() -> Self {
        Self {
            is_loading: false,
            is_authenticated: false,
            has_access: false,
            user: None,
        }
    }
}

struct Provider {
    client: KeycloakClient,
    end_session: Option<EndSessionUrl>,
}

pub struct Identity {
    config: IdentityConfig,
    pool: SqlitePool,
    init: OnceCell<()>,
    provider: OnceCell<Provider>,
    state: RwLock<AuthSnapshot>,
}

impl Identity {
    pub fn new(config: IdentityConfig, pool: SqlitePool) -> Self {
        Self {
            config,
            pool,
            init: OnceCell::new(),
            provider: OnceCell::new(),
            state: RwLock::new(AuthSnapshot::loading()),
        }
    }

    /// Settle the session context and return the snapshot. The underlying
    /// check runs at most once; concurrent callers await the same outcome.
    pub async fn initialize(&self) -> AuthSnapshot {
        self.init
            .get_or_init(|| async {
                let settled = match self.check_session().await {
                    Ok(snapshot) => snapshot,
                    Err(error) => {
                        tracing::warn!(%error, "session check failed, continuing unauthenticated");
                        AuthSnapshot::unauthenticated()
                    }
                };
                *self.state.write().await = settled;
            })
            .await;
        self.snapshot().await
    }

    /// Current snapshot without forcing initialization.
    pub async fn snapshot(&self) -> AuthSnapshot {
        self.state.read().await.clone()
    }

    async fn check_session(&self) -> Result<AuthSnapshot, AuthError> {
        if self.config.issuer_url.is_none() {
            return Ok(AuthSnapshot::unauthenticated());
        }
        let provider = self.provider().await?;

        // A silent check needs a token to redeem; without one the user
        // simply starts signed out.
        let Some(refresh_token) = self.config.refresh_token.clone() else {
            return Ok(AuthSnapshot::unauthenticated());
        };

        let token_response = provider
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        let id_token = token_response.id_token().ok_or(AuthError::MissingIdToken)?;
        let claims = id_token.claims(&provider.client.id_token_verifier(), nonce_not_required)?;
        Ok(self.authenticated(claims))
    }

    async fn provider(&self) -> Result<&Provider, AuthError> {
        self.provider
            .get_or_try_init(|| async {
                let issuer = self
                    .config
                    .issuer_url
                    .clone()
                    .ok_or(AuthError::NotConfigured)?;
                let issuer = IssuerUrl::new(issuer).map_err(|e| AuthError::Config(e.to_string()))?;

                let metadata =
                    ProviderMetadataWithLogout::discover_async(issuer, async_http_client)
                        .await
                        .map_err(|e| AuthError::Discovery(e.to_string()))?;
                let end_session = metadata.additional_metadata().end_session_endpoint.clone();

                let redirect = RedirectUrl::new(self.config.redirect_uri.clone())
                    .map_err(|e| AuthError::Config(e.to_string()))?;
                let client = KeycloakClient::from_provider_metadata(
                    metadata,
                    ClientId::new(self.config.client_id.clone()),
                    None,
                )
                .set_redirect_uri(redirect);

                Ok(Provider {
                    client,
                    end_session,
                })
            })
            .await
    }

    /// Start an interactive login and return the authorization URL to send
    /// the user to.
    pub async fn login(&self) -> Result<String, AuthError> {
        let provider = self.provider().await?;
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_state, nonce) = provider
            .client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge)
            .url();

        sqlx::query(
            "INSERT INTO auth_states (state, pkce_verifier, nonce, expires_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(csrf_state.secret())
        .bind(pkce_verifier.secret())
        .bind(nonce.secret())
        .bind(Utc::now() + Duration::minutes(10))
        .execute(&self.pool)
        .await?;

        Ok(auth_url.to_string())
    }

    /// Finish the login started by [`login`](Identity::login) with the code
    /// and state the provider sent back.
    pub async fn complete_login(&self, state: &str, code: &str) -> Result<AuthSnapshot, AuthError> {
        let provider = self.provider().await?;

        // Consume the pending row; expiry is validated in the same statement.
        let row: Option<(String, String)> = sqlx::query_as(
            "DELETE FROM auth_states WHERE state = ? AND expires_at > ? \
             RETURNING pkce_verifier, nonce",
        )
        .bind(state)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        let (pkce_verifier, nonce) = row.ok_or(AuthError::UnknownState)?;

        let token_response = provider
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        let id_token = token_response.id_token().ok_or(AuthError::MissingIdToken)?;
        let nonce = Nonce::new(nonce);
        let claims = id_token.claims(&provider.client.id_token_verifier(), &nonce)?;

        let settled = self.authenticated(claims);
        *self.state.write().await = settled.clone();
        Ok(settled)
    }

    /// Drop the session and return where to send the user: the provider's
    /// end-session URL targeting the portal, or the portal directly when
    /// the provider never came up.
    pub async fn logout(&self) -> String {
        *self.state.write().await = AuthSnapshot::unauthenticated();

        let Some(provider) = self.provider.get() else {
            return self.config.portal_url.clone();
        };
        let Some(end_session) = provider.end_session.clone() else {
            return self.config.portal_url.clone();
        };
        let Ok(post_logout) = PostLogoutRedirectUrl::new(self.config.portal_url.clone()) else {
            return self.config.portal_url.clone();
        };

        LogoutRequest::from(end_session)
            .set_client_id(ClientId::new(self.config.client_id.clone()))
            .set_post_logout_redirect_uri(post_logout)
            .http_get_url()
            .to_string()
    }

    pub fn portal_url(&self) -> &str {
        &self.config.portal_url
    }

    fn authenticated(&self, claims: &KeycloakIdTokenClaims) -> AuthSnapshot {
        let name = claims
            .preferred_username()
            .map(|u| u.to_string())
            .or_else(|| claims.name().and_then(|n| n.get(None)).map(|n| n.to_string()))
            .unwrap_or_else(|| "Utilisateur".to_string());
        let email = claims.email().map(|e| e.to_string()).unwrap_or_default();

        let roles = &claims.additional_claims().realm_access.roles;
        let has_access = roles
            .iter()
            .any(|role| role == SUPERADMIN_ROLE || role == &self.config.access_role);

        AuthSnapshot {
            is_loading: false,
            is_authenticated: true,
            has_access,
            user: Some(AuthUser { name, email }),
        }
    }
}

/// Refresh responses re-issue the ID token without the original nonce.
fn nonce_not_required(_: Option<&Nonce>) -> Result<(), String> {
    Ok(())
}
