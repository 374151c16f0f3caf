use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api::auth::Identity;
use api::AppState;
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tokio::signal::unix::{signal, SignalKind};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crate::settings::Settings;

/// Run the HTTP server until Ctrl+C or SIGTERM.
pub async fn launch() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let settings = Settings::new().context("failed to load settings")?;

    let pool = store::connect(&settings.database.url)
        .await
        .with_context(|| format!("failed to open {}", settings.database.url))?;
    store::migrate(&pool).await.context("failed to run migrations")?;

    let identity = Arc::new(Identity::new(settings.identity, pool.clone()));
    // Warm the session snapshot so the first /auth/me does not wait on discovery.
    let warmup = identity.clone();
    tokio::spawn(async move {
        warmup.initialize().await;
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = api::router(AppState::new(pool, identity)).layer(cors);

    let address = settings.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("listening on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server stopped")?;

    Ok(())
}

async fn shutdown_signal() {
    let interrupt = async {
        ctrl_c().await.expect("failed to install Ctrl+C handler");
        info!("received Ctrl+C, shutting down");
    };

    let terminate = async {
        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
        info!("received SIGTERM, shutting down");
    };

    tokio::select! {
        _ = interrupt => {},
        _ = terminate => {},
    }
}
