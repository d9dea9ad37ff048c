// handlers/public/chatbot.rs - Respondent-facing chat flow
//
//   GET  /chat/:formId                    render chat UI
//   GET  /api/form/:formId                form definition (counts a view)
//   GET  /api/generate-unique-id/:formId  mint a chat session
//   POST /api/submit-response             record answers for a session

use axum::{extract::State, response::Html};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::models::{ChatSession, Form, FormDefinition, Submission, Theme};
use crate::error::{ApiError, FieldErrors};
use crate::handlers::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult};
use crate::AppState;

const CHAT_TEMPLATE: &str = include_str!("../../../views/chatbot.html");

/// Malformed ids cannot name a form, so they read as missing rather than invalid.
fn parse_form_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("Form '{}' not found", raw)))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_page(form: &Form) -> String {
    // Name last so user text is never re-scanned for placeholders
    CHAT_TEMPLATE
        .replace("{{theme}}", theme_class(form))
        .replace("{{formId}}", &form.id.to_string())
        .replace("{{formName}}", &escape_html(&form.name))
}

fn theme_class(form: &Form) -> &'static str {
    match form.theme {
        Theme::Light => "theme-light",
        Theme::Dark => "theme-dark",
        Theme::TailBlue => "theme-tail-blue",
    }
}

/// GET /chat/:formId - render chat UI for a form
pub async fn render_chatbot(
    State(state): State<AppState>,
    ApiPath(form_id): ApiPath<String>,
) -> Result<Html<String>, ApiError> {
    let form = state.store.get_form(parse_form_id(&form_id)?).await?;
    Ok(Html(render_page(&form)))
}

/// GET /api/form/:formId - respondent-facing form definition
pub async fn form_definition(
    State(state): State<AppState>,
    ApiPath(form_id): ApiPath<String>,
) -> ApiResult<FormDefinition> {
    let form = state.store.record_form_view(parse_form_id(&form_id)?).await?;
    Ok(ApiResponse::success(form.definition()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueIdResponse {
    pub unique_id: Uuid,
    pub form_id: Uuid,
}

/// GET /api/generate-unique-id/:formId - start a chat session
pub async fn generate_unique_id(
    State(state): State<AppState>,
    ApiPath(form_id): ApiPath<String>,
) -> ApiResult<UniqueIdResponse> {
    let form = state.store.get_form(parse_form_id(&form_id)?).await?;
    let session = state.store.create_session(ChatSession::new(form.id)).await?;

    tracing::info!(form_id = %form.id, unique_id = %session.unique_id, "Chat session started");

    Ok(ApiResponse::created(UniqueIdResponse {
        unique_id: session.unique_id,
        form_id: session.form_id,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponseRequest {
    pub form_id: Uuid,
    pub unique_id: Uuid,
    #[serde(default)]
    pub answers: Map<String, Value>,
    #[serde(default)]
    pub completed: bool,
}

fn validate_answers(form: &Form, answers: &Map<String, Value>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for (field_id, answer) in answers {
        let outcome = match form.field(field_id) {
            Some(field) => field.validate_answer(answer),
            None => Err("Unknown field".to_string()),
        };
        if let Err(message) = outcome {
            errors.insert(field_id.clone(), message);
        }
    }
    errors
}

fn missing_required(form: &Form, answers: &Map<String, Value>) -> FieldErrors {
    form.fields
        .iter()
        .filter(|f| f.required && f.kind.is_input() && !answers.contains_key(&f.id))
        .map(|f| (f.id.clone(), "This field is required".to_string()))
        .collect()
}

/// Merge `request` into the session's submission, creating it on first contact.
pub async fn record_response(state: &AppState, request: SubmitResponseRequest) -> Result<(Submission, bool), ApiError> {
    let session = state.store.get_session(request.unique_id).await?;
    if session.form_id != request.form_id {
        return Err(ApiError::bad_request("Session does not belong to this form"));
    }
    let form = state.store.get_form(request.form_id).await?;

    let errors = validate_answers(&form, &request.answers);
    if !errors.is_empty() {
        return Err(ApiError::unprocessable_entity("Invalid answers", errors));
    }

    let existing = state.store.find_submission_by_session(session.unique_id).await?;
    let created = existing.is_none();
    let mut submission = existing.unwrap_or_else(|| Submission::start(&session));

    if submission.is_completed() {
        return Err(ApiError::conflict("Submission already completed"));
    }

    submission.merge_answers(request.answers);

    if request.completed {
        let missing = missing_required(&form, &submission.answers);
        if !missing.is_empty() {
            return Err(ApiError::unprocessable_entity("Required fields are unanswered", missing));
        }
        submission.complete();
    }

    let submission = state.store.save_submission(submission).await?;
    tracing::info!(
        form_id = %submission.form_id,
        unique_id = %submission.unique_id,
        status = ?submission.status,
        "Response recorded"
    );
    Ok((submission, created))
}

/// POST /api/submit-response - record a respondent's answers
pub async fn submit_response(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SubmitResponseRequest>,
) -> ApiResult<Submission> {
    let (submission, created) = record_response(&state, request).await?;
    Ok(if created {
        ApiResponse::created(submission)
    } else {
        ApiResponse::success(submission)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::database::models::{FieldKind, Folder, FormField, User};
    use crate::database::{MemoryStore, Store, StoreResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn form() -> Form {
        Form::new(
            Uuid::new_v4(),
            None,
            "<Signup> & \"more\"".to_string(),
            Theme::Dark,
            vec![
                FormField {
                    id: "greeting".into(),
                    kind: FieldKind::TextBubble,
                    content: "Hi!".into(),
                    options: vec![],
                    required: false,
                },
                FormField {
                    id: "email".into(),
                    kind: FieldKind::EmailInput,
                    content: "Your email?".into(),
                    options: vec![],
                    required: true,
                },
            ],
        )
    }

    #[test]
    fn page_embeds_escaped_name_and_id() {
        let form = form();
        let page = render_page(&form);

        assert!(page.contains(&form.id.to_string()));
        assert!(page.contains("&lt;Signup&gt; &amp; &quot;more&quot;"));
        assert!(page.contains("theme-dark"));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn non_uuid_form_id_is_not_found() {
        assert!(matches!(parse_form_id("abc123"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn answers_to_bubbles_and_unknown_fields_are_rejected() {
        let form = form();
        let mut answers = Map::new();
        answers.insert("greeting".into(), json!("hello"));
        answers.insert("nope".into(), json!("x"));
        answers.insert("email".into(), json!("ada@example.com"));

        let errors = validate_answers(&form, &answers);
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("greeting"));
        assert_eq!(errors["nope"], "Unknown field");
    }

    #[test]
    fn required_inputs_are_reported() {
        let form = form();
        let missing = missing_required(&form, &Map::new());
        assert_eq!(missing.keys().collect::<Vec<_>>(), vec!["email"]);
    }

    /// Holds back saves of unfinished submissions so a completing request can overtake them.
    struct SlowPartialSaves(MemoryStore);

    #[async_trait]
    impl Store for SlowPartialSaves {
        async fn create_user(&self, user: User) -> StoreResult<User> {
            self.0.create_user(user).await
        }
        async fn get_user(&self, id: Uuid) -> StoreResult<User> {
            self.0.get_user(id).await
        }
        async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
            self.0.find_user_by_email(email).await
        }
        async fn update_user(&self, user: User) -> StoreResult<User> {
            self.0.update_user(user).await
        }
        async fn create_folder(&self, folder: Folder) -> StoreResult<Folder> {
            self.0.create_folder(folder).await
        }
        async fn get_folder(&self, id: Uuid) -> StoreResult<Folder> {
            self.0.get_folder(id).await
        }
        async fn list_folders(&self, owner_id: Uuid) -> StoreResult<Vec<Folder>> {
            self.0.list_folders(owner_id).await
        }
        async fn update_folder(&self, folder: Folder) -> StoreResult<Folder> {
            self.0.update_folder(folder).await
        }
        async fn delete_folder(&self, id: Uuid) -> StoreResult<()> {
            self.0.delete_folder(id).await
        }
        async fn create_form(&self, form: Form) -> StoreResult<Form> {
            self.0.create_form(form).await
        }
        async fn get_form(&self, id: Uuid) -> StoreResult<Form> {
            self.0.get_form(id).await
        }
        async fn list_forms(&self, owner_id: Uuid) -> StoreResult<Vec<Form>> {
            self.0.list_forms(owner_id).await
        }
        async fn update_form(&self, form: Form) -> StoreResult<Form> {
            self.0.update_form(form).await
        }
        async fn delete_form(&self, id: Uuid) -> StoreResult<()> {
            self.0.delete_form(id).await
        }
        async fn record_form_view(&self, id: Uuid) -> StoreResult<Form> {
            self.0.record_form_view(id).await
        }
        async fn create_session(&self, session: ChatSession) -> StoreResult<ChatSession> {
            self.0.create_session(session).await
        }
        async fn get_session(&self, unique_id: Uuid) -> StoreResult<ChatSession> {
            self.0.get_session(unique_id).await
        }
        async fn save_submission(&self, submission: Submission) -> StoreResult<Submission> {
            if !submission.is_completed() {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            self.0.save_submission(submission).await
        }
        async fn get_submission(&self, id: Uuid) -> StoreResult<Submission> {
            self.0.get_submission(id).await
        }
        async fn find_submission_by_session(&self, unique_id: Uuid) -> StoreResult<Option<Submission>> {
            self.0.find_submission_by_session(unique_id).await
        }
        async fn list_submissions(&self, form_id: Uuid) -> StoreResult<Vec<Submission>> {
            self.0.list_submissions(form_id).await
        }
        async fn delete_submission(&self, id: Uuid) -> StoreResult<()> {
            self.0.delete_submission(id).await
        }
    }

    fn answer(form: &Form, session: &ChatSession, field: &str, value: Value, completed: bool) -> SubmitResponseRequest {
        SubmitResponseRequest {
            form_id: form.id,
            unique_id: session.unique_id,
            answers: Map::from_iter([(field.to_string(), value)]),
            completed,
        }
    }

    #[tokio::test]
    async fn late_partial_answer_cannot_reopen_completed_submission() {
        let memory = MemoryStore::new();
        let form = memory.create_form(form()).await.unwrap();
        let session = memory.create_session(ChatSession::new(form.id)).await.unwrap();
        let state = AppState::new(AppConfig::development(), Arc::new(SlowPartialSaves(memory.clone())));

        // Submission exists and is in progress
        record_response(&state, answer(&form, &session, "email", json!("first@example.com"), false))
            .await
            .unwrap();

        let (late, done) = tokio::join!(
            record_response(&state, answer(&form, &session, "email", json!("late@example.com"), false)),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                record_response(&state, answer(&form, &session, "email", json!("final@example.com"), true)).await
            }
        );

        assert!(done.is_ok());
        assert!(matches!(late, Err(ApiError::Conflict(_))));

        let stored = memory.find_submission_by_session(session.unique_id).await.unwrap().unwrap();
        assert!(stored.is_completed());
        assert_eq!(stored.answers["email"], json!("final@example.com"));
    }
}
