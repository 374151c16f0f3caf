//! Identity context over the OpenID Connect provider.

mod claims;
mod config;
mod identity;

pub use claims::{KeycloakClaims, RealmAccess};
pub use config::IdentityConfig;
pub use identity::{AuthError, AuthSnapshot, AuthUser, Identity, SUPERADMIN_ROLE};
