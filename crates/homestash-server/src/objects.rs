//! Handlers for the `/api/objects` routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use homestash_store::{
    NewObject, ObjectDetails, ObjectFilter, ObjectHistoryDetails, StoreError, UpdateObject,
};

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ListObjectsQuery {
    pub category: Option<i64>,
    pub location: Option<i64>,
    pub search: Option<String>,
}

#[derive(Serialize)]
pub struct ObjectsResponse {
    objects: Vec<ObjectDetails>,
}

#[derive(Serialize)]
pub struct ObjectResponse {
    object: ObjectDetails,
}

#[derive(Serialize)]
pub struct ObjectWithHistoryResponse {
    object: ObjectDetails,
    history: Vec<ObjectHistoryDetails>,
}

/// Request body shared by create and update: update replaces every field
/// with exactly what the caller sends.
#[derive(Deserialize)]
pub struct ObjectPayload {
    #[serde(default)]
    name: String,
    description: Option<String>,
    category_id: Option<i64>,
    location_id: Option<i64>,
    photo_url: Option<String>,
}

fn object_not_found() -> ApiError {
    ApiError::NotFound("Object not found".to_string())
}

/// A dangling `category_id`/`location_id` is the only constraint an object
/// mutation can break.
fn map_reference_error(e: StoreError) -> ApiError {
    match e {
        StoreError::Constraint(_) => {
            ApiError::NotFound("Referenced category or location does not exist".to_string())
        }
        other => ApiError::from(other),
    }
}

/// `GET /api/objects`
pub async fn list_objects(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListObjectsQuery>,
) -> Result<Json<ObjectsResponse>, ApiError> {
    let filter = ObjectFilter {
        category: query.category,
        location: query.location,
        search: query.search,
    };

    let db = state.db.lock().await;
    let objects = db.list_objects(&filter)?;
    Ok(Json(ObjectsResponse { objects }))
}

/// `GET /api/objects/{id}`
pub async fn get_object(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ObjectWithHistoryResponse>, ApiError> {
    let db = state.db.lock().await;
    let object = db.get_object(id).map_err(|e| match e {
        StoreError::NotFound => object_not_found(),
        other => ApiError::from(other),
    })?;
    let history = db.history_for_object(id)?;
    Ok(Json(ObjectWithHistoryResponse { object, history }))
}

/// `POST /api/objects`
pub async fn create_object(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ObjectPayload>,
) -> Result<(StatusCode, Json<ObjectResponse>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::InvalidInput("Object name is required".to_string()));
    }

    let new_object = NewObject {
        name: payload.name,
        description: payload.description,
        category_id: payload.category_id,
        location_id: payload.location_id,
        photo_url: payload.photo_url,
        added_by: auth.id,
    };

    let db = state.db.lock().await;
    let object = db.create_object(&new_object).map_err(map_reference_error)?;

    info!(object = object.object.id, user = auth.id, "created object");

    Ok((StatusCode::CREATED, Json(ObjectResponse { object })))
}

/// `PUT /api/objects/{id}`
///
/// When the payload moves the object to a different location, the store
/// appends the audit row and applies the update in one transaction; the
/// authenticated caller is recorded as the mover.
pub async fn update_object(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<ObjectPayload>,
) -> Result<Json<ObjectResponse>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::InvalidInput("Object name is required".to_string()));
    }

    let update = UpdateObject {
        name: payload.name,
        description: payload.description,
        category_id: payload.category_id,
        location_id: payload.location_id,
        photo_url: payload.photo_url,
    };

    let mut db = state.db.lock().await;
    let object = db.update_object(id, &update, auth.id).map_err(|e| match e {
        StoreError::NotFound => object_not_found(),
        other => map_reference_error(other),
    })?;

    Ok(Json(ObjectResponse { object }))
}

/// `DELETE /api/objects/{id}`
pub async fn delete_object(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let db = state.db.lock().await;
    db.delete_object(id).map_err(|e| match e {
        StoreError::NotFound => object_not_found(),
        other => ApiError::from(other),
    })?;

    info!(object = id, user = auth.id, "deleted object");

    Ok(Json(serde_json::json!({
        "message": "Object deleted successfully"
    })))
}
