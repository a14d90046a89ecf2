//! # homestash-server
//!
//! HTTP API server for the homestash household-object tracker.
//!
//! This binary provides:
//! - **Registration and login** with salted password hashes and signed,
//!   time-bounded session tokens
//! - **CRUD APIs** for objects, storage locations, and categories, backed
//!   by a SQLite store that enforces referential integrity
//! - **A location-change audit trail**, appended in the same transaction as
//!   the object update that moves it
//! - **Photo upload storage** (files stored as opaque bytes on disk)

mod api;
mod auth;
mod categories;
mod config;
mod error;
mod locations;
mod objects;
mod upload;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use homestash_store::Database;

use crate::api::AppState;
use crate::auth::TokenKeys;
use crate::config::ServerConfig;
use crate::upload::PhotoStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,homestash_server=debug")),
        )
        .init();

    info!("Starting homestash server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        addr = %config.http_addr,
        token_ttl_days = config.token_ttl_days,
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Open the store and seed an empty one
    // -----------------------------------------------------------------------
    let database = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    database.seed_defaults()?;

    // -----------------------------------------------------------------------
    // 4. Initialize subsystems
    // -----------------------------------------------------------------------
    let photos = Arc::new(
        PhotoStore::new(config.photo_storage_path.clone(), config.max_photo_size).await?,
    );
    let token_keys = TokenKeys::new(&config.jwt_secret);

    let state = AppState {
        db: Arc::new(Mutex::new(database)),
        photos,
        token_keys,
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
