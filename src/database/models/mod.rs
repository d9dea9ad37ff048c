pub mod folder;
pub mod form;
pub mod submission;
pub mod user;

pub use folder::Folder;
pub use form::{FieldKind, Form, FormDefinition, FormField, Theme};
pub use submission::{ChatSession, FormStats, Submission, SubmissionStatus};
pub use user::User;
