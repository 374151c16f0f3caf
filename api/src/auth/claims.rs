//! Keycloak-flavoured OpenID Connect type aliases.
//!
//! Keycloak publishes realm roles in a `realm_access` claim the standard
//! claim set does not know about. The aliases below thread
//! [`KeycloakClaims`] through the stock client types so role checks can
//! read roles straight off the verified ID token.

use openidconnect::core::{
    CoreAuthDisplay, CoreAuthPrompt, CoreErrorResponseType, CoreGenderClaim, CoreJsonWebKey,
    CoreJsonWebKeyType, CoreJsonWebKeyUse, CoreJweContentEncryptionAlgorithm,
    CoreJwsSigningAlgorithm, CoreRevocableToken, CoreRevocationErrorResponse,
    CoreTokenIntrospectionResponse, CoreTokenType,
};
use openidconnect::{
    AdditionalClaims, Client, EmptyExtraTokenFields, IdTokenClaims, IdTokenFields,
    StandardErrorResponse, StandardTokenResponse,
};
use serde::{Deserialize, Serialize};

/// Realm roles as Keycloak serializes them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Extra ID token claims carried by Keycloak.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeycloakClaims {
    #[serde(default)]
    pub realm_access: RealmAccess,
}

impl AdditionalClaims for KeycloakClaims {}

pub type KeycloakIdTokenFields = IdTokenFields<
    KeycloakClaims,
    EmptyExtraTokenFields,
    CoreGenderClaim,
    CoreJweContentEncryptionAlgorithm,
    CoreJwsSigningAlgorithm,
    CoreJsonWebKeyType,
>;

pub type KeycloakTokenResponse = StandardTokenResponse<KeycloakIdTokenFields, CoreTokenType>;

/// OpenID Connect client with the Keycloak claim set in place of the
/// standard one.
pub type KeycloakClient = Client<
    KeycloakClaims,
    CoreAuthDisplay,
    CoreGenderClaim,
    CoreJweContentEncryptionAlgorithm,
    CoreJwsSigningAlgorithm,
    CoreJsonWebKeyType,
    CoreJsonWebKeyUse,
    CoreJsonWebKey,
    CoreAuthPrompt,
    StandardErrorResponse<CoreErrorResponseType>,
    KeycloakTokenResponse,
    CoreTokenType,
    CoreTokenIntrospectionResponse,
    CoreRevocableToken,
    CoreRevocationErrorResponse,
>;

pub type KeycloakIdTokenClaims = IdTokenClaims<KeycloakClaims, CoreGenderClaim>;
