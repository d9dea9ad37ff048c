// handlers/protected/user_content.rs - /api/user dashboard content and profile

use axum::{extract::State, Extension};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password};
use crate::database::models::{user::normalize_email, Folder, Form, User};
use crate::error::ApiError;
use crate::handlers::public::auth::check_credentials;
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContent {
    pub folders: Vec<Folder>,
    /// Forms not filed in any folder.
    pub forms: Vec<Form>,
    pub total_forms: usize,
}

/// GET /api/user/content - everything the dashboard shows at the root
pub async fn get_content(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<UserContent> {
    let folders = state.store.list_folders(auth.user_id).await?;
    let mut forms = state.store.list_forms(auth.user_id).await?;
    let total_forms = forms.len();
    forms.retain(|f| f.folder_id.is_none());

    Ok(ApiResponse::success(UserContent {
        folders,
        forms,
        total_forms,
    }))
}

/// GET /api/user/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<User> {
    Ok(ApiResponse::success(state.store.get_user(auth.user_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

/// PUT /api/user/profile - changing the password requires the current one
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<User> {
    let errors = check_credentials(
        update.username.as_deref(),
        update.email.as_deref(),
        update.new_password.as_deref(),
    );
    if !errors.is_empty() {
        return Err(ApiError::unprocessable_entity("Invalid profile details", errors));
    }

    let mut user = state.store.get_user(auth.user_id).await?;

    if let Some(new_password) = update.new_password {
        let old_password = update
            .old_password
            .ok_or_else(|| ApiError::bad_request("oldPassword is required to change the password"))?;
        if !verify_password(old_password, user.password_hash.clone()).await? {
            return Err(ApiError::unauthorized("Current password is incorrect"));
        }
        user.password_hash = hash_password(new_password, state.config.security.bcrypt_cost).await?;
    }
    if let Some(username) = update.username {
        user.username = username.trim().to_string();
    }
    if let Some(email) = update.email {
        user.email = normalize_email(&email);
    }
    user.updated_at = Utc::now();

    let user = state.store.update_user(user).await?;
    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(ApiResponse::success(user))
}
