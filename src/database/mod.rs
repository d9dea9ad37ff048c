pub mod memory;
pub mod models;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use models::{ChatSession, Folder, Form, Submission, User};

pub use memory::MemoryStore;

/// Errors from a Store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for users, folders, forms, chat sessions and submissions.
///
/// Ownership checks are the caller's job; the store only enforces uniqueness
/// and keeps related records consistent on delete.
#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn create_user(&self, user: User) -> StoreResult<User>;
    async fn get_user(&self, id: Uuid) -> StoreResult<User>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn update_user(&self, user: User) -> StoreResult<User>;

    // Folders
    async fn create_folder(&self, folder: Folder) -> StoreResult<Folder>;
    async fn get_folder(&self, id: Uuid) -> StoreResult<Folder>;
    async fn list_folders(&self, owner_id: Uuid) -> StoreResult<Vec<Folder>>;
    async fn update_folder(&self, folder: Folder) -> StoreResult<Folder>;
    /// Removes the folder; its forms move to the owner's root.
    async fn delete_folder(&self, id: Uuid) -> StoreResult<()>;

    // Forms
    async fn create_form(&self, form: Form) -> StoreResult<Form>;
    async fn get_form(&self, id: Uuid) -> StoreResult<Form>;
    async fn list_forms(&self, owner_id: Uuid) -> StoreResult<Vec<Form>>;
    /// Replaces the editable parts of a form. `views`, `owner_id` and
    /// `created_at` keep their stored values.
    async fn update_form(&self, form: Form) -> StoreResult<Form>;
    /// Removes the form together with its sessions and submissions.
    async fn delete_form(&self, id: Uuid) -> StoreResult<()>;
    async fn record_form_view(&self, id: Uuid) -> StoreResult<Form>;

    // Chat sessions
    async fn create_session(&self, session: ChatSession) -> StoreResult<ChatSession>;
    async fn get_session(&self, unique_id: Uuid) -> StoreResult<ChatSession>;

    // Submissions
    /// Inserts or replaces a submission. A stored submission that is already
    /// completed is never replaced (`Conflict`).
    async fn save_submission(&self, submission: Submission) -> StoreResult<Submission>;
    async fn get_submission(&self, id: Uuid) -> StoreResult<Submission>;
    async fn find_submission_by_session(&self, unique_id: Uuid) -> StoreResult<Option<Submission>>;
    async fn list_submissions(&self, form_id: Uuid) -> StoreResult<Vec<Submission>>;
    async fn delete_submission(&self, id: Uuid) -> StoreResult<()>;
}
