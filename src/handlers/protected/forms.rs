// handlers/protected/forms.rs - /api/forms CRUD

use axum::{extract::State, Extension};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::form::validate_form;
use crate::database::models::{Form, FormField, Theme};
use crate::error::ApiError;
use crate::handlers::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::AppState;

/// Load a form the caller owns.
pub async fn owned_form(state: &AppState, id: Uuid, auth: &AuthUser) -> Result<Form, ApiError> {
    let form = state.store.get_form(id).await?;
    if form.owner_id != auth.user_id {
        return Err(ApiError::forbidden("You do not own this form"));
    }
    Ok(form)
}

/// A folder reference must point at one of the caller's folders.
async fn check_folder(state: &AppState, folder_id: Option<Uuid>, auth: &AuthUser) -> Result<(), ApiError> {
    let Some(folder_id) = folder_id else {
        return Ok(());
    };
    match state.store.get_folder(folder_id).await {
        Ok(folder) if folder.owner_id == auth.user_id => Ok(()),
        _ => Err(ApiError::bad_request(format!("Unknown folder '{}'", folder_id))),
    }
}

fn check_structure(name: &str, fields: &[FormField]) -> Result<(), ApiError> {
    let errors = validate_form(name, fields);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::unprocessable_entity("Invalid form definition", errors))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFormsQuery {
    pub folder_id: Option<Uuid>,
}

/// GET /api/forms?folderId= - caller's forms, optionally one folder's
pub async fn list_forms(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<ListFormsQuery>,
) -> ApiResult<Vec<Form>> {
    let mut forms = state.store.list_forms(auth.user_id).await?;
    if let Some(folder_id) = query.folder_id {
        forms.retain(|f| f.folder_id == Some(folder_id));
    }
    Ok(ApiResponse::success(forms))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormRequest {
    pub name: String,
    #[serde(default)]
    pub folder_id: Option<Uuid>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

/// POST /api/forms
pub async fn create_form(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<FormRequest>,
) -> ApiResult<Form> {
    check_structure(&request.name, &request.fields)?;
    check_folder(&state, request.folder_id, &auth).await?;

    let form = Form::new(
        auth.user_id,
        request.folder_id,
        request.name.trim().to_string(),
        request.theme,
        request.fields,
    );
    let form = state.store.create_form(form).await?;

    tracing::info!(form_id = %form.id, owner = %auth.user_id, "Form created");
    Ok(ApiResponse::created(form))
}

/// GET /api/forms/:id
pub async fn get_form(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Form> {
    Ok(ApiResponse::success(owned_form(&state, id, &auth).await?))
}

/// PUT /api/forms/:id - replace name, folder, theme and fields
pub async fn update_form(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<FormRequest>,
) -> ApiResult<Form> {
    let mut form = owned_form(&state, id, &auth).await?;
    check_structure(&request.name, &request.fields)?;
    check_folder(&state, request.folder_id, &auth).await?;

    form.name = request.name.trim().to_string();
    form.folder_id = request.folder_id;
    form.theme = request.theme;
    form.fields = request.fields;
    form.updated_at = Utc::now();

    Ok(ApiResponse::success(state.store.update_form(form).await?))
}

/// DELETE /api/forms/:id - also drops the form's sessions and submissions
pub async fn delete_form(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    owned_form(&state, id, &auth).await?;
    state.store.delete_form(id).await?;

    tracing::info!(form_id = %id, "Form deleted");
    Ok(ApiResponse::<()>::no_content())
}
