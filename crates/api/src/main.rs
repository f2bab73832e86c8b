mod auth;
mod config;
mod error;
mod middleware;
mod routes;
mod state;

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use marquee_core::catalog::repository::MovieRepository;
use marquee_core::store::github::GitHubStore;
use marquee_core::store::memory::MemoryStore;
use marquee_core::{DocumentStore, SyncGateway};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, SyncBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().nth(1).as_deref() == Some("hash-password") {
        return hash_password();
    }

    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!("Starting marquee API server");

    let store: Arc<dyn DocumentStore> = match &config.sync_backend {
        SyncBackend::GitHub(gh) => {
            tracing::info!(owner = %gh.owner, repo = %gh.repo, branch = %gh.branch, "Using GitHub document store");
            Arc::new(GitHubStore::new(gh.clone())?)
        }
        SyncBackend::Memory => {
            tracing::warn!("Using in-memory document store; saved data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    let gateway = SyncGateway::new(store, config.paths.clone());

    let catalog = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .min_connections(config.db_min_connections)
                .connect(url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {e}"))?;
            tracing::info!("Connected to PostgreSQL");

            sqlx::migrate!("../../migrations")
                .run(&pool)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
            tracing::info!("Database migrations applied");

            Some(MovieRepository::new(pool))
        }
        None => {
            tracing::info!("DATABASE_URL not set; relational catalog disabled");
            None
        }
    };

    let auth = auth::EditorAuth::new(
        config.editor_password_hash.clone(),
        &config.jwt_secret,
        Duration::from_secs(config.edit_token_ttl_secs),
    )?;
    if !auth.is_enabled() {
        tracing::warn!("EDITOR_PASSWORD_HASH not set; write routes are open");
    }

    let state = state::AppState::new(gateway, catalog, auth);

    let app = routes::build_router(state)
        .layer(middleware::request_tracing::body_limit_layer(config.max_body_bytes))
        .layer(middleware::request_tracing::trace_layer())
        .layer(middleware::cors::cors_layer());

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Read a passphrase from stdin and print its argon2 hash for
/// `EDITOR_PASSWORD_HASH`.
fn hash_password() -> anyhow::Result<()> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    anyhow::ensure!(!password.is_empty(), "no passphrase given on stdin");

    let salt = SaltString::encode_b64(uuid::Uuid::new_v4().as_bytes())
        .map_err(|e| anyhow::anyhow!("Failed to build salt: {e}"))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash passphrase: {e}"))?;
    println!("{hash}");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}
