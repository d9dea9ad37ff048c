// handlers/protected/submissions.rs - /api/submissions, form owners only

use axum::{extract::State, Extension};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{FormStats, Submission};
use crate::error::ApiError;
use crate::handlers::ApiPath;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::AppState;

use super::forms::owned_form;

#[derive(Debug, Serialize)]
pub struct FormSubmissions {
    pub stats: FormStats,
    pub submissions: Vec<Submission>,
}

async fn owned_submission(state: &AppState, id: Uuid, auth: &AuthUser) -> Result<Submission, ApiError> {
    let submission = state.store.get_submission(id).await?;
    owned_form(state, submission.form_id, auth).await?;
    Ok(submission)
}

/// GET /api/submissions/form/:formId - submissions plus view/start/completion stats
pub async fn list_form_submissions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(form_id): ApiPath<Uuid>,
) -> ApiResult<FormSubmissions> {
    let form = owned_form(&state, form_id, &auth).await?;
    let submissions = state.store.list_submissions(form.id).await?;
    let stats = FormStats::compute(form.views, &submissions);
    Ok(ApiResponse::success(FormSubmissions { stats, submissions }))
}

/// GET /api/submissions/:id
pub async fn get_submission(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Submission> {
    Ok(ApiResponse::success(owned_submission(&state, id, &auth).await?))
}

/// DELETE /api/submissions/:id
pub async fn delete_submission(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    owned_submission(&state, id, &auth).await?;
    state.store.delete_submission(id).await?;
    Ok(ApiResponse::<()>::no_content())
}
