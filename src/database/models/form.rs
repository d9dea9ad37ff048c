use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::FieldErrors;

use super::user::is_valid_email;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    TailBlue,
}

/// Chat flow element. Bubbles are shown to the respondent; inputs collect an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    TextBubble,
    ImageBubble,
    VideoBubble,
    GifBubble,
    TextInput,
    NumberInput,
    EmailInput,
    PhoneInput,
    DateInput,
    RatingInput,
    ButtonInput,
}

impl FieldKind {
    pub fn is_input(self) -> bool {
        !matches!(
            self,
            FieldKind::TextBubble | FieldKind::ImageBubble | FieldKind::VideoBubble | FieldKind::GifBubble
        )
    }
}

pub const MAX_RATING: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub id: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

impl FormField {
    /// Check a respondent's answer against this field's kind.
    pub fn validate_answer(&self, answer: &Value) -> Result<(), String> {
        match self.kind {
            FieldKind::TextBubble | FieldKind::ImageBubble | FieldKind::VideoBubble | FieldKind::GifBubble => {
                Err("Field does not accept answers".to_string())
            }
            FieldKind::TextInput => match answer.as_str() {
                Some(s) if !s.trim().is_empty() => Ok(()),
                _ => Err("Expected a non-empty text answer".to_string()),
            },
            FieldKind::NumberInput => {
                let numeric = answer.is_number()
                    || answer
                        .as_str()
                        .and_then(|s| s.trim().parse::<f64>().ok())
                        .is_some_and(f64::is_finite);
                if numeric {
                    Ok(())
                } else {
                    Err("Expected a number".to_string())
                }
            }
            FieldKind::EmailInput => match answer.as_str() {
                Some(s) if is_valid_email(s) => Ok(()),
                _ => Err("Invalid email address".to_string()),
            },
            FieldKind::PhoneInput => match answer.as_str() {
                Some(s) if is_valid_phone(s) => Ok(()),
                _ => Err("Invalid phone number".to_string()),
            },
            FieldKind::DateInput => match answer.as_str().map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")) {
                Some(Ok(_)) => Ok(()),
                _ => Err("Expected a date in YYYY-MM-DD format".to_string()),
            },
            FieldKind::RatingInput => match answer.as_i64() {
                Some(n) if (1..=MAX_RATING).contains(&n) => Ok(()),
                _ => Err(format!("Expected a rating between 1 and {}", MAX_RATING)),
            },
            FieldKind::ButtonInput => match answer.as_str() {
                Some(s) if self.options.iter().any(|o| o == s) => Ok(()),
                _ => Err("Answer must be one of the offered options".to_string()),
            },
        }
    }
}

fn is_valid_phone(value: &str) -> bool {
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '));
    let digits = value.chars().filter(char::is_ascii_digit).count();
    allowed && (7..=15).contains(&digits)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub folder_id: Option<Uuid>,
    pub name: String,
    pub theme: Theme,
    pub fields: Vec<FormField>,
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Form {
    pub fn new(owner_id: Uuid, folder_id: Option<Uuid>, name: String, theme: Theme, fields: Vec<FormField>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            folder_id,
            name,
            theme,
            fields,
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// The respondent-facing subset of the form.
    pub fn definition(&self) -> FormDefinition {
        FormDefinition {
            id: self.id,
            name: self.name.clone(),
            theme: self.theme,
            fields: self.fields.clone(),
        }
    }
}

/// Structural checks applied whenever a form is created or replaced.
pub fn validate_form(name: &str, fields: &[FormField]) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if name.trim().is_empty() {
        errors.insert("name".to_string(), "Form name is required".to_string());
    }

    let mut seen = HashSet::new();
    for (index, field) in fields.iter().enumerate() {
        let key = format!("fields[{}]", index);
        if field.id.trim().is_empty() {
            errors.insert(key, "Field id is required".to_string());
        } else if !seen.insert(field.id.as_str()) {
            errors.insert(key, format!("Duplicate field id '{}'", field.id));
        } else if field.kind == FieldKind::ButtonInput && field.options.is_empty() {
            errors.insert(key, "Button input needs at least one option".to_string());
        } else if !field.kind.is_input() && field.content.trim().is_empty() {
            errors.insert(key, "Bubble content is required".to_string());
        }
    }

    errors
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    pub id: Uuid,
    pub name: String,
    pub theme: Theme,
    pub fields: Vec<FormField>,
}
