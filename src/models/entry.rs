use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is submitting a form. Resolved by the transport layer before the
/// submission processor runs: a verified bearer token yields `User`,
/// anything else is a guest. Contact fields are optional; identity is
/// decided by authentication state, not by what the client typed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitter {
    User(Uuid),
    Guest {
        name: Option<String>,
        email: Option<String>,
    },
}

impl Submitter {
    pub fn is_guest(&self) -> bool {
        matches!(self, Submitter::Guest { .. })
    }
}

/// One graded answer as stored on an entry. Question text, option labels
/// and the note are copied in so the stored result is unaffected by later
/// edits to the question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: Uuid,
    pub question_text: String,
    pub selected: Vec<i16>,
    pub selected_labels: Vec<String>,
    /// `None` for questions without a correct-answer marker.
    pub correct: Option<bool>,
    pub note: Option<String>,
}

pub const ENTRY_STATUS_COMPLETE: &str = "complete";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub build_id: Uuid,
    pub build_title: String,
    pub user_id: Option<Uuid>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub answers: Vec<AnswerRecord>,
    pub correct_count: i32,
    pub scorable_count: i32,
    pub percentage: Decimal,
    /// `None` when the build had no scorable question.
    pub passed: Option<bool>,
    pub status: String,
    pub form_token: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub build_id: Uuid,
    pub build_title: String,
    pub user_id: Option<Uuid>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub answers: Vec<AnswerRecord>,
    pub correct_count: i32,
    pub scorable_count: i32,
    pub percentage: Decimal,
    pub passed: Option<bool>,
    pub form_token: String,
}
