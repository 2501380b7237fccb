//! # Zargar API Server
//!
//! Axum REST front end for the gold-shop bookkeeping system.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. tracing subscriber (RUST_LOG-driven)                                │
//! │  2. Config::from_env()                                                  │
//! │  3. Database::new() ← pool + embedded migrations                        │
//! │  4. bootstrap admin  ← only when the user table is empty                │
//! │  5. axum::serve on the configured address                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod auth;
mod config;
mod error;
mod routes;
mod state;

use anyhow::Context;
use tracing::info;
use zargar_db::{Database, DbConfig};

use crate::auth::JwtManager;
use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let config = Config::from_env();
    info!(bind_addr = %config.bind_addr, db = %config.database_path, "Starting Zargar API server");

    let db = Database::new(DbConfig::new(&config.database_path))
        .await
        .context("database initialization failed")?;

    bootstrap_admin(&db, &config).await?;

    let jwt = JwtManager::new(&config.jwt_secret, config.jwt_ttl);
    let app = routes::router(AppState::new(db, jwt));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Creates the initial admin account on a fresh database so the first
/// operator can log in at all.
async fn bootstrap_admin(db: &Database, config: &Config) -> anyhow::Result<()> {
    let users = db.users();
    if !users.list().await?.is_empty() {
        return Ok(());
    }

    let password_hash = auth::hash_password(&config.bootstrap_admin_password)
        .map_err(|e| anyhow::anyhow!("failed to hash bootstrap password: {e}"))?;
    users
        .bootstrap_admin(&config.bootstrap_admin_username, &password_hash)
        .await
        .context("failed to bootstrap admin account")?;

    info!(
        username = %config.bootstrap_admin_username,
        "Created initial admin account; change its password immediately"
    );
    Ok(())
}
