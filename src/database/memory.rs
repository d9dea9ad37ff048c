use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::models::{ChatSession, Folder, Form, Submission, User};
use super::{Store, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    folders: HashMap<Uuid, Folder>,
    forms: HashMap<Uuid, Form>,
    sessions: HashMap<Uuid, ChatSession>,
    submissions: HashMap<Uuid, Submission>,
}

/// Process-local store. All tables sit behind one lock so cascading deletes
/// are observed atomically.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_creation<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    items
}

fn folder_name_taken(tables: &Tables, folder: &Folder) -> bool {
    tables.folders.values().any(|f| {
        f.id != folder.id && f.owner_id == folder.owner_id && f.name.eq_ignore_ascii_case(&folder.name)
    })
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: User) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("Email '{}' is already registered", user.email)));
        }
        tables.users.insert(user.id, user.clone());
        debug!("Created user {}", user.id);
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<User> {
        let tables = self.tables.read().await;
        tables.users.get(&id).cloned().ok_or_else(|| StoreError::not_found("User", id))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: User) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(StoreError::not_found("User", user.id));
        }
        if tables.users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(StoreError::Conflict(format!("Email '{}' is already registered", user.email)));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn create_folder(&self, folder: Folder) -> StoreResult<Folder> {
        let mut tables = self.tables.write().await;
        if folder_name_taken(&tables, &folder) {
            return Err(StoreError::Conflict(format!("Folder '{}' already exists", folder.name)));
        }
        tables.folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn get_folder(&self, id: Uuid) -> StoreResult<Folder> {
        let tables = self.tables.read().await;
        tables.folders.get(&id).cloned().ok_or_else(|| StoreError::not_found("Folder", id))
    }

    async fn list_folders(&self, owner_id: Uuid) -> StoreResult<Vec<Folder>> {
        let tables = self.tables.read().await;
        let folders = tables.folders.values().filter(|f| f.owner_id == owner_id).cloned().collect();
        Ok(sorted_by_creation(folders, |f: &Folder| f.created_at))
    }

    async fn update_folder(&self, folder: Folder) -> StoreResult<Folder> {
        let mut tables = self.tables.write().await;
        if !tables.folders.contains_key(&folder.id) {
            return Err(StoreError::not_found("Folder", folder.id));
        }
        if folder_name_taken(&tables, &folder) {
            return Err(StoreError::Conflict(format!("Folder '{}' already exists", folder.name)));
        }
        tables.folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn delete_folder(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.folders.remove(&id).is_none() {
            return Err(StoreError::not_found("Folder", id));
        }
        let now = chrono::Utc::now();
        for form in tables.forms.values_mut().filter(|f| f.folder_id == Some(id)) {
            form.folder_id = None;
            form.updated_at = now;
        }
        debug!("Deleted folder {}", id);
        Ok(())
    }

    async fn create_form(&self, form: Form) -> StoreResult<Form> {
        let mut tables = self.tables.write().await;
        tables.forms.insert(form.id, form.clone());
        Ok(form)
    }

    async fn get_form(&self, id: Uuid) -> StoreResult<Form> {
        let tables = self.tables.read().await;
        tables.forms.get(&id).cloned().ok_or_else(|| StoreError::not_found("Form", id))
    }

    async fn list_forms(&self, owner_id: Uuid) -> StoreResult<Vec<Form>> {
        let tables = self.tables.read().await;
        let forms = tables.forms.values().filter(|f| f.owner_id == owner_id).cloned().collect();
        Ok(sorted_by_creation(forms, |f: &Form| f.created_at))
    }

    async fn update_form(&self, form: Form) -> StoreResult<Form> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .forms
            .get_mut(&form.id)
            .ok_or_else(|| StoreError::not_found("Form", form.id))?;
        // Views are counted concurrently by respondents; never write back a stale count
        *stored = Form {
            owner_id: stored.owner_id,
            views: stored.views,
            created_at: stored.created_at,
            ..form
        };
        Ok(stored.clone())
    }

    async fn delete_form(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.forms.remove(&id).is_none() {
            return Err(StoreError::not_found("Form", id));
        }
        tables.sessions.retain(|_, s| s.form_id != id);
        tables.submissions.retain(|_, s| s.form_id != id);
        debug!("Deleted form {} with its sessions and submissions", id);
        Ok(())
    }

    async fn record_form_view(&self, id: Uuid) -> StoreResult<Form> {
        let mut tables = self.tables.write().await;
        let form = tables.forms.get_mut(&id).ok_or_else(|| StoreError::not_found("Form", id))?;
        form.views += 1;
        Ok(form.clone())
    }

    async fn create_session(&self, session: ChatSession) -> StoreResult<ChatSession> {
        let mut tables = self.tables.write().await;
        if !tables.forms.contains_key(&session.form_id) {
            return Err(StoreError::not_found("Form", session.form_id));
        }
        tables.sessions.insert(session.unique_id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, unique_id: Uuid) -> StoreResult<ChatSession> {
        let tables = self.tables.read().await;
        tables
            .sessions
            .get(&unique_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Session", unique_id))
    }

    async fn save_submission(&self, submission: Submission) -> StoreResult<Submission> {
        let mut tables = self.tables.write().await;
        if !tables.forms.contains_key(&submission.form_id) {
            return Err(StoreError::not_found("Form", submission.form_id));
        }
        if tables.submissions.get(&submission.id).is_some_and(|s| s.is_completed()) {
            return Err(StoreError::Conflict("Submission already completed".to_string()));
        }
        let duplicate = tables
            .submissions
            .values()
            .any(|s| s.unique_id == submission.unique_id && s.id != submission.id);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "Session {} already has a submission",
                submission.unique_id
            )));
        }
        tables.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn get_submission(&self, id: Uuid) -> StoreResult<Submission> {
        let tables = self.tables.read().await;
        tables
            .submissions
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Submission", id))
    }

    async fn find_submission_by_session(&self, unique_id: Uuid) -> StoreResult<Option<Submission>> {
        let tables = self.tables.read().await;
        Ok(tables.submissions.values().find(|s| s.unique_id == unique_id).cloned())
    }

    async fn list_submissions(&self, form_id: Uuid) -> StoreResult<Vec<Submission>> {
        let tables = self.tables.read().await;
        let submissions = tables.submissions.values().filter(|s| s.form_id == form_id).cloned().collect();
        Ok(sorted_by_creation(submissions, |s: &Submission| s.created_at))
    }

    async fn delete_submission(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .submissions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("Submission", id))
    }
}
