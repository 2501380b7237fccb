//! # Server Configuration
//!
//! All configuration comes from environment variables with development
//! defaults. Nothing here is hot-reloadable; restart to apply changes.

use std::time::Duration;

/// Runtime configuration for the API server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file.
    pub database_path: String,

    /// Address the HTTP server binds to.
    pub bind_addr: String,

    /// Secret for signing JWTs. MUST be overridden in production.
    pub jwt_secret: String,

    /// Access token lifetime.
    pub jwt_ttl: Duration,

    /// Credentials for the initial admin account, created only when the
    /// user table is empty.
    pub bootstrap_admin_username: String,
    pub bootstrap_admin_password: String,
}

impl Config {
    /// Loads configuration from the environment.
    ///
    /// | Variable                | Default            |
    /// |-------------------------|--------------------|
    /// | `ZARGAR_DB_PATH`        | `./zargar.db`      |
    /// | `ZARGAR_BIND_ADDR`      | `127.0.0.1:8080`   |
    /// | `ZARGAR_JWT_SECRET`     | dev-only fallback  |
    /// | `ZARGAR_JWT_TTL_MINUTES`| `1440`             |
    /// | `ZARGAR_ADMIN_USERNAME` | `admin`            |
    /// | `ZARGAR_ADMIN_PASSWORD` | `admin`            |
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("ZARGAR_JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("ZARGAR_JWT_SECRET not set; using development fallback key");
            "zargar-development-secret-do-not-use-in-production".to_string()
        });

        let ttl_minutes: u64 = std::env::var("ZARGAR_JWT_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1440);

        Config {
            database_path: std::env::var("ZARGAR_DB_PATH")
                .unwrap_or_else(|_| "./zargar.db".to_string()),
            bind_addr: std::env::var("ZARGAR_BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            jwt_secret,
            jwt_ttl: Duration::from_secs(ttl_minutes * 60),
            bootstrap_admin_username: std::env::var("ZARGAR_ADMIN_USERNAME")
                .unwrap_or_else(|_| "admin".to_string()),
            bootstrap_admin_password: std::env::var("ZARGAR_ADMIN_PASSWORD")
                .unwrap_or_else(|_| "admin".to_string()),
        }
    }
}
