//! `medvault` server binary: loads settings, picks a store and serves the API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use api::auth::{CredentialStore, PasswordHasher, TokenService};
use api::rate_limit::{limit_by_ip, RateLimiter};
use api::records::RecordService;
use api::security::security_headers;
use api::uploads::UploadStore;
use api::{router, AppState};
use axum::middleware;
use store::{MemoryStore, RecordStore, UserStore};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod settings;

use settings::Settings;

type Stores = (Arc<dyn UserStore>, Arc<dyn RecordStore>);

async fn open_stores(settings: &Settings) -> anyhow::Result<Stores> {
    match settings.database.url() {
        Some(url) => {
            let pool = api::db::connect(url, settings.database.max_connections)
                .await
                .context("Failed to connect to database")?;
            api::db::migrate(&pool)
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Using PostgreSQL store");
            let store = api::db::PgStore::new(pool);
            Ok((Arc::new(store.clone()), Arc::new(store)))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; data is kept in memory and lost on exit");
            let store = MemoryStore::new();
            Ok((Arc::new(store.clone()), Arc::new(store)))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let settings = Settings::new().context("Failed to load settings")?;

    let token_config = settings
        .auth
        .token_config()
        .context("Invalid token settings")?;
    let tokens =
        Arc::new(TokenService::new(token_config).context("Cannot start without JWT_SECRET")?);
    let hasher = PasswordHasher::new(settings.auth.hash_config())
        .context("Invalid password hashing settings")?;

    let (users, records) = open_stores(&settings).await?;
    let credentials =
        CredentialStore::new(users, hasher).context("Failed to prepare credential store")?;

    tokio::fs::create_dir_all(&settings.uploads.dir)
        .await
        .with_context(|| format!("Failed to create upload directory {}", settings.uploads.dir))?;

    let state = AppState {
        credentials: Arc::new(credentials),
        tokens,
        records: RecordService::new(records),
        uploads: UploadStore::new(&settings.uploads.dir),
        body_limit: settings.uploads.max_bytes,
    };

    let limiter = RateLimiter::new(settings.rate_limit.config());
    let app = security_headers(router(state))
        .layer(middleware::from_fn_with_state(limiter, limit_by_ip))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = settings.server.addr().context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    Ok(())
}
