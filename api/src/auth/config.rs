//! Identity provider configuration.

use serde::Deserialize;

/// Connection settings for the OpenID Connect provider.
///
/// Without an `issuer_url` the provider is considered absent and the session
/// context settles unauthenticated without touching the network. Keycloak
/// issuers look like `https://auth.example.com/realms/<realm>`.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub issuer_url: Option<String>,
    pub client_id: String,
    pub redirect_uri: String,
    /// Realm role that grants access to the application, next to the
    /// always-accepted `superadmin`.
    pub access_role: String,
    /// Where signed-out users and visitors without access land.
    pub portal_url: String,
    /// Refresh token redeemed at startup for a silent session check.
    pub refresh_token: Option<String>,
}
