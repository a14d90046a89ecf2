//! Opaque photo storage on the local filesystem.
//!
//! The rest of the system never inspects image bytes: an upload stores them
//! and hands back a URL, and that URL is all an object's `photo_url` ever
//! holds.  An object record is only mutated after an upload has returned,
//! so an upload failure cannot leave the store pointing at nothing.

use std::path::PathBuf;

use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;

/// Stores uploaded photos as UUID-named files under a base directory.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    base_path: PathBuf,
    max_size: usize,
}

impl PhotoStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ApiError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ApiError::Internal(format!(
                "failed to create photo directory '{}': {e}",
                base_path.display()
            ))
        })?;

        info!(path = %base_path.display(), "photo store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Store photo bytes and return the generated id.
    pub async fn store(&self, data: &[u8]) -> Result<Uuid, ApiError> {
        if data.is_empty() {
            return Err(ApiError::InvalidInput("Empty upload".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ApiError::InvalidInput(format!(
                "Photo too large: {} bytes (max {})",
                data.len(),
                self.max_size
            )));
        }

        let id = Uuid::new_v4();
        let path = self.photo_path(&id);

        fs::write(&path, data)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to write photo {id}: {e}")))?;

        debug!(id = %id, size = data.len(), "stored photo");
        Ok(id)
    }

    /// Read back stored photo bytes.
    pub async fn read(&self, id: Uuid) -> Result<Vec<u8>, ApiError> {
        let path = self.photo_path(&id);
        if !path.exists() {
            return Err(ApiError::NotFound("Photo not found".to_string()));
        }

        fs::read(&path)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to read photo {id}: {e}")))
    }

    /// Delete a stored photo.
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let path = self.photo_path(&id);
        if !path.exists() {
            return Err(ApiError::NotFound("Photo not found".to_string()));
        }

        fs::remove_file(&path)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to delete photo {id}: {e}")))?;

        debug!(id = %id, "deleted photo");
        Ok(())
    }

    // A UUID's display form is fixed hex-and-dashes, so the joined path
    // cannot escape the base directory.
    fn photo_path(&self, id: &Uuid) -> PathBuf {
        self.base_path.join(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct UploadResponse {
    url: String,
    id: Uuid,
}

/// `POST /api/upload` (multipart, `photo` field)
pub async fn upload_photo(
    State(state): State<AppState>,
    _auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "photo" {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::InvalidInput(format!("Failed to read field: {e}")))?;

            let id = state.photos.store(&data).await?;

            info!(id = %id, size = data.len(), "photo uploaded");

            return Ok(Json(UploadResponse {
                url: format!("/api/uploads/{id}"),
                id,
            }));
        }
    }

    Err(ApiError::InvalidInput(
        "Missing 'photo' field in multipart form".to_string(),
    ))
}

/// `GET /api/uploads/{id}`
pub async fn serve_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Vec<u8>, ApiError> {
    state.photos.read(id).await
}

/// `DELETE /api/upload/{id}`
pub async fn delete_photo(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.photos.delete(id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
