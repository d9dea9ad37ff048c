// handlers/public/auth.rs - /api/auth/* token acquisition
//
//   POST /api/auth/register  create an account
//   POST /api/auth/login     exchange credentials for a JWT
//   GET  /api/auth/me        current user (protected)

use axum::{extract::State, Extension};
use serde::{Deserialize, Serialize};

use crate::auth::{dummy_hash, hash_password, issue_token, verify_password, AuthError};
use crate::database::models::{user::is_valid_email, user::normalize_email, User};
use crate::error::{ApiError, FieldErrors};
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::AppState;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Shared by registration and profile updates.
pub fn check_credentials(username: Option<&str>, email: Option<&str>, password: Option<&str>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if let Some(username) = username {
        if username.trim().is_empty() {
            errors.insert("username".to_string(), "Username is required".to_string());
        }
    }
    if let Some(email) = email {
        if !is_valid_email(email) {
            errors.insert("email".to_string(), "Invalid email address".to_string());
        }
    }
    if let Some(password) = password {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.insert(
                "password".to_string(),
                format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            );
        }
    }
    errors
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<User> {
    let errors = check_credentials(Some(&request.username), Some(&request.email), Some(&request.password));
    if !errors.is_empty() {
        return Err(ApiError::unprocessable_entity("Invalid registration details", errors));
    }

    let password_hash = hash_password(request.password, state.config.security.bcrypt_cost).await?;
    let user = User::new(request.username.trim().to_string(), request.email, password_hash);
    let user = state.store.create_user(user).await?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok(ApiResponse::created(user))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let email = normalize_email(&request.email);

    // Unknown email and wrong password are indistinguishable to the caller,
    // in the response and in the bcrypt work done
    let user = state.store.find_user_by_email(&email).await?;
    let hash = match &user {
        Some(user) => user.password_hash.clone(),
        None => dummy_hash(state.config.security.bcrypt_cost).await?.to_string(),
    };
    let verified = verify_password(request.password, hash).await?;

    let user = match user {
        Some(user) if verified => user,
        Some(user) => {
            tracing::warn!(user_id = %user.id, "Failed login attempt");
            return Err(AuthError::InvalidCredentials.into());
        }
        None => return Err(AuthError::InvalidCredentials.into()),
    };

    let token = issue_token(user.id, &user.email, &state.config.security)?;
    Ok(ApiResponse::success(LoginResponse { token, user }))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<User> {
    let user = state.store.get_user(auth.user_id).await?;
    Ok(ApiResponse::success(user))
}
