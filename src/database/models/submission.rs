use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A respondent's chat session, minted before the first answer arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub unique_id: Uuid,
    pub form_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(form_id: Uuid) -> Self {
        Self {
            unique_id: Uuid::new_v4(),
            form_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Started,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub form_id: Uuid,
    pub unique_id: Uuid,
    pub answers: Map<String, Value>,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn start(session: &ChatSession) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            form_id: session.form_id,
            unique_id: session.unique_id,
            answers: Map::new(),
            status: SubmissionStatus::Started,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == SubmissionStatus::Completed
    }

    /// Later answers for the same field replace earlier ones.
    pub fn merge_answers(&mut self, answers: Map<String, Value>) {
        self.answers.extend(answers);
        self.updated_at = Utc::now();
    }

    pub fn complete(&mut self) {
        let now = Utc::now();
        self.status = SubmissionStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormStats {
    pub views: u64,
    pub starts: u64,
    pub completed: u64,
    pub completion_rate: f64,
}

impl FormStats {
    pub fn compute(views: u64, submissions: &[Submission]) -> Self {
        let starts = submissions.len() as u64;
        let completed = submissions.iter().filter(|s| s.is_completed()).count() as u64;
        let completion_rate = if starts == 0 {
            0.0
        } else {
            (completed as f64 / starts as f64 * 10000.0).round() / 100.0
        };

        Self {
            views,
            starts,
            completed,
            completion_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overwrites_same_field() {
        let session = ChatSession::new(Uuid::new_v4());
        let mut submission = Submission::start(&session);

        let mut first = Map::new();
        first.insert("name".to_string(), json!("Ada"));
        submission.merge_answers(first);

        let mut second = Map::new();
        second.insert("name".to_string(), json!("Grace"));
        second.insert("age".to_string(), json!(36));
        submission.merge_answers(second);

        assert_eq!(submission.answers["name"], "Grace");
        assert_eq!(submission.answers.len(), 2);
        assert_eq!(submission.unique_id, session.unique_id);
    }

    #[test]
    fn stats_round_completion_rate() {
        let session = ChatSession::new(Uuid::new_v4());
        let mut done = Submission::start(&session);
        done.complete();
        let open = Submission::start(&session);
        let open2 = Submission::start(&session);

        let stats = FormStats::compute(10, &[done, open, open2]);
        assert_eq!(stats.starts, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.completion_rate, 33.33);
        assert_eq!(FormStats::compute(4, &[]).completion_rate, 0.0);
    }
}
