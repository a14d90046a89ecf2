//! Handlers for the `/api/locations` routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use homestash_store::{Location, LocationSummary, ObjectDetails, StoreError};

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct LocationsResponse {
    locations: Vec<LocationSummary>,
}

#[derive(Serialize)]
pub struct LocationResponse {
    location: Location,
}

#[derive(Serialize)]
pub struct LocationWithObjectsResponse {
    location: Location,
    objects: Vec<ObjectDetails>,
}

#[derive(Deserialize)]
pub struct LocationPayload {
    #[serde(default)]
    name: String,
    description: Option<String>,
    address: Option<String>,
}

fn location_not_found() -> ApiError {
    ApiError::NotFound("Location not found".to_string())
}

/// `GET /api/locations`
pub async fn list_locations(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<LocationsResponse>, ApiError> {
    let db = state.db.lock().await;
    let locations = db.list_locations()?;
    Ok(Json(LocationsResponse { locations }))
}

/// `GET /api/locations/{id}`
pub async fn get_location(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<LocationWithObjectsResponse>, ApiError> {
    let db = state.db.lock().await;
    let location = db.get_location(id).map_err(|e| match e {
        StoreError::NotFound => location_not_found(),
        other => ApiError::from(other),
    })?;
    let objects = db.objects_at_location(id)?;
    Ok(Json(LocationWithObjectsResponse { location, objects }))
}

/// `POST /api/locations`
pub async fn create_location(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<LocationPayload>,
) -> Result<(StatusCode, Json<LocationResponse>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "Location name is required".to_string(),
        ));
    }

    let db = state.db.lock().await;
    let location = db.create_location(
        &payload.name,
        payload.description.as_deref(),
        payload.address.as_deref(),
    )?;

    Ok((StatusCode::CREATED, Json(LocationResponse { location })))
}

/// `PUT /api/locations/{id}`
pub async fn update_location(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<LocationPayload>,
) -> Result<Json<LocationResponse>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "Location name is required".to_string(),
        ));
    }

    let db = state.db.lock().await;
    let location = db
        .update_location(
            id,
            &payload.name,
            payload.description.as_deref(),
            payload.address.as_deref(),
        )
        .map_err(|e| match e {
            StoreError::NotFound => location_not_found(),
            other => ApiError::from(other),
        })?;

    Ok(Json(LocationResponse { location }))
}

/// `DELETE /api/locations/{id}`
///
/// Refused while any object is stored at the location -- the caller has to
/// move or delete those objects first.
pub async fn delete_location(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut db = state.db.lock().await;
    db.delete_location(id).map_err(|e| match e {
        StoreError::NotFound => location_not_found(),
        StoreError::Constraint(_) => ApiError::Conflict(
            "Cannot delete location with objects. Move or delete objects first.".to_string(),
        ),
        other => ApiError::from(other),
    })?;

    info!(location = id, user = auth.id, "deleted location");

    Ok(Json(serde_json::json!({
        "message": "Location deleted successfully"
    })))
}
