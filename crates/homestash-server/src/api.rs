//! Router assembly and shared application state.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use homestash_store::Database;

use crate::auth::TokenKeys;
use crate::config::ServerConfig;
use crate::upload::PhotoStore;
use crate::{auth, categories, locations, objects, upload};

/// Shared state handed to every handler.
///
/// The store handle is injected explicitly rather than reached through a
/// global; the mutex serializes access to the single SQLite connection and
/// is released on every exit path of a handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub photos: Arc<PhotoStore>,
    pub token_keys: TokenKeys,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    // Leave headroom above the photo cap for multipart framing.
    let body_limit = state.config.max_photo_size + 2 * 1024 * 1024;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route(
            "/api/objects",
            get(objects::list_objects).post(objects::create_object),
        )
        .route(
            "/api/objects/{id}",
            get(objects::get_object)
                .put(objects::update_object)
                .delete(objects::delete_object),
        )
        .route(
            "/api/locations",
            get(locations::list_locations).post(locations::create_location),
        )
        .route(
            "/api/locations/{id}",
            get(locations::get_location)
                .put(locations::update_location)
                .delete(locations::delete_location),
        )
        .route(
            "/api/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/categories/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route("/api/upload", post(upload::upload_photo))
        .route("/api/upload/{id}", delete(upload::delete_photo))
        .route("/api/uploads/{id}", get(upload::serve_photo))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
