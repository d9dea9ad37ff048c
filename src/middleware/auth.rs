use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{bearer_token, validate_jwt, Claims};
use crate::database::StoreError;
use crate::error::ApiError;
use crate::AppState;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context.
///
/// A token whose user no longer exists is treated like an invalid token.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| ApiError::unauthorized("Invalid Authorization header format")))
        .transpose()?;

    let token = bearer_token(header)?;
    let claims = validate_jwt(token, &state.config.security.jwt_secret)?;

    match state.store.get_user(claims.sub).await {
        Ok(_) => {}
        Err(StoreError::NotFound { .. }) => {
            tracing::warn!("Token presented for unknown user {}", claims.sub);
            return Err(ApiError::unauthorized("User no longer exists"));
        }
        Err(e) => return Err(e.into()),
    }

    // Convert claims to AuthUser and inject into request
    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}
