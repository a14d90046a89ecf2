//! Handlers for the `/api/categories` routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use homestash_store::{Category, CategorySummary, StoreError};

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct CategoriesResponse {
    categories: Vec<CategorySummary>,
}

#[derive(Serialize)]
pub struct CategoryResponse {
    category: Category,
}

#[derive(Deserialize)]
pub struct CategoryPayload {
    #[serde(default)]
    name: String,
    color: Option<String>,
}

fn duplicate_name() -> ApiError {
    ApiError::Conflict("Category with this name already exists".to_string())
}

/// `GET /api/categories`
pub async fn list_categories(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let db = state.db.lock().await;
    let categories = db.list_categories()?;
    Ok(Json(CategoriesResponse { categories }))
}

/// `POST /api/categories`
pub async fn create_category(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<CategoryPayload>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "Category name is required".to_string(),
        ));
    }

    let db = state.db.lock().await;
    let category = db
        .create_category(&payload.name, payload.color.as_deref())
        .map_err(|e| match e {
            StoreError::Constraint(_) => duplicate_name(),
            other => ApiError::from(other),
        })?;

    Ok((StatusCode::CREATED, Json(CategoryResponse { category })))
}

/// `PUT /api/categories/{id}`
pub async fn update_category(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryPayload>,
) -> Result<Json<CategoryResponse>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "Category name is required".to_string(),
        ));
    }

    let db = state.db.lock().await;
    let category = db
        .update_category(id, &payload.name, payload.color.as_deref())
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("Category not found".to_string()),
            StoreError::Constraint(_) => duplicate_name(),
            other => ApiError::from(other),
        })?;

    Ok(Json(CategoryResponse { category }))
}

/// `DELETE /api/categories/{id}`
///
/// Unconditional: objects carrying the category keep existing with their
/// `category_id` cleared.
pub async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let db = state.db.lock().await;
    db.delete_category(id).map_err(|e| match e {
        StoreError::NotFound => ApiError::NotFound("Category not found".to_string()),
        other => ApiError::from(other),
    })?;

    info!(category = id, user = auth.id, "deleted category");

    Ok(Json(serde_json::json!({
        "message": "Category deleted successfully"
    })))
}
