// handlers/protected/folders.rs - /api/folders CRUD

use axum::{extract::State, Extension};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{Folder, Form};
use crate::error::{ApiError, FieldErrors};
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FolderRequest {
    pub name: String,
}

impl FolderRequest {
    fn name(&self) -> Result<String, ApiError> {
        let name = self.name.trim();
        if name.is_empty() {
            let mut errors = FieldErrors::new();
            errors.insert("name".to_string(), "Folder name is required".to_string());
            return Err(ApiError::unprocessable_entity("Invalid folder", errors));
        }
        Ok(name.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct FolderWithForms {
    pub folder: Folder,
    pub forms: Vec<Form>,
}

async fn owned_folder(state: &AppState, id: Uuid, auth: &AuthUser) -> Result<Folder, ApiError> {
    let folder = state.store.get_folder(id).await?;
    if folder.owner_id != auth.user_id {
        return Err(ApiError::forbidden("You do not own this folder"));
    }
    Ok(folder)
}

/// GET /api/folders
pub async fn list_folders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<Folder>> {
    Ok(ApiResponse::success(state.store.list_folders(auth.user_id).await?))
}

/// POST /api/folders
pub async fn create_folder(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<FolderRequest>,
) -> ApiResult<Folder> {
    let folder = Folder::new(auth.user_id, request.name()?);
    let folder = state.store.create_folder(folder).await?;
    Ok(ApiResponse::created(folder))
}

/// GET /api/folders/:id - the folder and the forms filed in it
pub async fn get_folder(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<FolderWithForms> {
    let folder = owned_folder(&state, id, &auth).await?;
    let mut forms = state.store.list_forms(auth.user_id).await?;
    forms.retain(|f| f.folder_id == Some(folder.id));
    Ok(ApiResponse::success(FolderWithForms { folder, forms }))
}

/// PUT /api/folders/:id - rename
pub async fn update_folder(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<FolderRequest>,
) -> ApiResult<Folder> {
    let mut folder = owned_folder(&state, id, &auth).await?;
    folder.name = request.name()?;
    folder.updated_at = Utc::now();
    Ok(ApiResponse::success(state.store.update_folder(folder).await?))
}

/// DELETE /api/folders/:id - forms inside move back to the root
pub async fn delete_folder(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    owned_folder(&state, id, &auth).await?;
    state.store.delete_folder(id).await?;
    Ok(ApiResponse::<()>::no_content())
}
