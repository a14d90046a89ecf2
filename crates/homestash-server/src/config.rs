//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Fixed fallback signing secret.  Fine for local development, useless for
/// anything reachable from the network; `from_env` warns when it is in use.
pub const DEV_JWT_SECRET: &str = "homestash-dev-secret-change-me";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:5000`
    pub http_addr: SocketAddr,

    /// Filesystem path of the SQLite database.  When unset, the store picks
    /// the platform-appropriate data directory.
    /// Env: `DATABASE_PATH`
    pub database_path: Option<PathBuf>,

    /// Secret used to sign and verify session tokens.
    /// Env: `JWT_SECRET`
    /// Default: [`DEV_JWT_SECRET`] (development only).
    pub jwt_secret: String,

    /// Session token validity window in days.
    /// Env: `TOKEN_TTL_DAYS`
    /// Default: `7`
    pub token_ttl_days: i64,

    /// Filesystem path where uploaded photos are stored.
    /// Env: `PHOTO_STORAGE_PATH`
    /// Default: `./photos`
    pub photo_storage_path: PathBuf,

    /// Maximum photo size in bytes (10 MiB).
    pub max_photo_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 5000).into(),
            database_path: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_days: 7,
            photo_storage_path: PathBuf::from("./photos"),
            max_photo_size: 10 * 1024 * 1024, // 10 MiB
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.is_empty() {
                config.jwt_secret = secret;
            }
        }
        if config.jwt_secret == DEV_JWT_SECRET {
            tracing::warn!("JWT_SECRET not set, using the development secret");
        }

        if let Ok(val) = std::env::var("TOKEN_TTL_DAYS") {
            match val.parse::<i64>() {
                Ok(days) if days > 0 => config.token_ttl_days = days,
                _ => tracing::warn!(value = %val, "Invalid TOKEN_TTL_DAYS, using default"),
            }
        }

        if let Ok(path) = std::env::var("PHOTO_STORAGE_PATH") {
            config.photo_storage_path = PathBuf::from(path);
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
