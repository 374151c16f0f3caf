use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use api::auth::IdentityConfig;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Server {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub url: String,
}

/// Layered configuration: defaults, then `config.toml`, then the environment.
///
/// Environment keys use a double underscore between section and field, so
/// `SERVER__PORT=8080` or `IDENTITY__ISSUER_URL=...`. The conventional
/// `DATABASE_URL` wins over everything else when it is set.
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub identity: IdentityConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite://courses.db")?
            .set_default("identity.client_id", "shopping")?
            .set_default(
                "identity.redirect_uri",
                "http://localhost:3000/auth/callback",
            )?
            .set_default("identity.access_role", "shopping.access")?
            .set_default("identity.portal_url", "https://cyriongames.fr")?
            .add_source(
                File::with_name("config.toml")
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::default().separator("__"))
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?;

        config.try_deserialize()
    }
}
